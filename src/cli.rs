use std::path::PathBuf;

use crate::{Result, SketchError, config::AppConfig};

pub const USAGE: &str = "sketchbook list
sketchbook render <name> [--seed N] [--frames N] [--out DIR] [--scale F]";

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    List,
    Render {
        name: String,
        seed: Option<u64>,
        frames: Option<u32>,
        out: Option<PathBuf>,
        scale: Option<f64>,
    },
}

fn value<'a, I: Iterator<Item = &'a str>>(args: &mut I, flag: &str) -> Result<&'a str> {
    args.next()
        .ok_or_else(|| SketchError::Usage(format!("{} needs a value", flag)))
}

fn parse_value<'a, T: std::str::FromStr, I: Iterator<Item = &'a str>>(
    args: &mut I,
    flag: &str,
) -> Result<T> {
    let raw = value(args, flag)?;
    raw.parse()
        .map_err(|_| SketchError::Usage(format!("invalid value for {}: {}", flag, raw)))
}

impl Command {
    /// `args` without the program name.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut args = args.iter().map(|a| a.as_ref());

        match args.next() {
            Some("list") => match args.next() {
                None => Ok(Command::List),
                Some(extra) => Err(SketchError::Usage(format!("unexpected argument: {}", extra))),
            },
            Some("render") => {
                let name = args
                    .next()
                    .filter(|n| !n.starts_with("--"))
                    .ok_or_else(|| SketchError::Usage("render needs a sketch name".to_string()))?
                    .to_string();

                let mut seed = None;
                let mut frames = None;
                let mut out = None;
                let mut scale = None;
                while let Some(flag) = args.next() {
                    match flag {
                        "--seed" => seed = Some(parse_value(&mut args, flag)?),
                        "--frames" => frames = Some(parse_value(&mut args, flag)?),
                        "--out" => out = Some(PathBuf::from(value(&mut args, flag)?)),
                        "--scale" => scale = Some(parse_value(&mut args, flag)?),
                        _ => return Err(SketchError::Usage(format!("unknown flag: {}", flag))),
                    }
                }

                Ok(Command::Render {
                    name,
                    seed,
                    frames,
                    out,
                    scale,
                })
            }
            Some(other) => Err(SketchError::Usage(format!("unknown command: {}", other))),
            None => Err(SketchError::Usage("missing command".to_string())),
        }
    }

    /// Command line flags win over the loaded config.
    pub fn override_config(&self, config: &mut AppConfig) {
        if let Command::Render {
            seed,
            frames,
            out,
            scale,
            ..
        } = self
        {
            if let Some(seed) = seed {
                config.render.seed = Some(*seed);
            }
            if let Some(frames) = frames {
                config.render.frames = Some(*frames);
            }
            if let Some(out) = out {
                config.output.dir = out.clone();
            }
            if let Some(scale) = scale {
                config.render.scale = *scale;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list() {
        assert_eq!(Command::parse(&["list"]).unwrap(), Command::List);
        assert!(Command::parse(&["list", "extra"]).is_err());
    }

    #[test]
    fn parse_render_with_flags() {
        let cmd = Command::parse(&[
            "render", "growth", "--seed", "7", "--frames", "12", "--out", "tmp", "--scale", "0.5",
        ])
        .unwrap();
        assert_eq!(
            cmd,
            Command::Render {
                name: "growth".to_string(),
                seed: Some(7),
                frames: Some(12),
                out: Some(PathBuf::from("tmp")),
                scale: Some(0.5),
            }
        );
    }

    #[test]
    fn parse_errors_are_usage_errors() {
        let bad: [&[&str]; 6] = [
            &[],
            &["draw"],
            &["render"],
            &["render", "--seed", "1"],
            &["render", "growth", "--seed"],
            &["render", "growth", "--seed", "many"],
        ];
        for args in bad {
            assert!(
                matches!(Command::parse(args), Err(SketchError::Usage(_))),
                "{:?}",
                args
            );
        }
        assert!(Command::parse(&["render", "growth", "--fast"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let mut config = AppConfig::default();
        Command::parse(&["render", "tiles", "--scale", "0.25", "--out", "x"])
            .unwrap()
            .override_config(&mut config);
        assert_eq!(config.render.scale, 0.25);
        assert_eq!(config.output.dir, PathBuf::from("x"));
        assert_eq!(config.render.seed, None);
    }
}
