use std::{
    path::Path,
    process::{Command, Stdio},
};

use anyhow::Context as _;
use tracing::{debug, info, warn};

use crate::{
    desktop::environment::DesktopEnvironment,
    foundation::error::{Goes16Error, Goes16Result},
};

/// One external command that applies the wallpaper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WallpaperCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Optional commands may fail (e.g. keys missing on older releases).
    pub required: bool,
}

impl WallpaperCommand {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            required: true,
        }
    }

    fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn run(&self) -> anyhow::Result<()> {
        debug!(program = %self.program, args = ?self.args, "running wallpaper command");
        let status = Command::new(&self.program)
            .args(&self.args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("failed to run '{}'", self.program))?;
        anyhow::ensure!(status.success(), "'{}' exited with {status}", self.program);
        Ok(())
    }
}

/// Commands that set `image` (an absolute path) as the wallpaper of `env`.
pub fn wallpaper_commands(env: &DesktopEnvironment, image: &Path) -> Option<Vec<WallpaperCommand>> {
    let lossy = image.to_string_lossy();
    let path: &str = &lossy;
    let uri = format!("file://{path}");
    let uri = uri.as_str();

    let cmds = match env {
        DesktopEnvironment::Gnome
        | DesktopEnvironment::Unity
        | DesktopEnvironment::Budgie
        | DesktopEnvironment::Pantheon => vec![
            WallpaperCommand::new(
                "gsettings",
                &["set", "org.gnome.desktop.background", "picture-uri", uri],
            ),
            WallpaperCommand::new(
                "gsettings",
                &["set", "org.gnome.desktop.background", "picture-uri-dark", uri],
            )
            .optional(),
            WallpaperCommand::new(
                "gsettings",
                &["set", "org.gnome.desktop.background", "picture-options", "scaled"],
            )
            .optional(),
        ],
        DesktopEnvironment::Cinnamon => vec![
            WallpaperCommand::new(
                "gsettings",
                &["set", "org.cinnamon.desktop.background", "picture-uri", uri],
            ),
            WallpaperCommand::new(
                "gsettings",
                &["set", "org.cinnamon.desktop.background", "picture-options", "scaled"],
            )
            .optional(),
        ],
        DesktopEnvironment::Mate => vec![WallpaperCommand::new(
            "gsettings",
            &["set", "org.mate.background", "picture-filename", path],
        )],
        DesktopEnvironment::Xfce => vec![WallpaperCommand::new(
            "xfconf-query",
            &[
                "-c",
                "xfce4-desktop",
                "-p",
                "/backdrop/screen0/monitor0/workspace0/last-image",
                "-s",
                path,
            ],
        )],
        DesktopEnvironment::Kde => {
            vec![WallpaperCommand::new("plasma-apply-wallpaperimage", &[path])]
        }
        DesktopEnvironment::Lxde => vec![WallpaperCommand::new(
            "pcmanfm",
            &["--set-wallpaper", path, "--wallpaper-mode=fit"],
        )],
        DesktopEnvironment::Lxqt => vec![WallpaperCommand::new(
            "pcmanfm-qt",
            &["--set-wallpaper", path, "--wallpaper-mode=fit"],
        )],
        DesktopEnvironment::Sway => vec![WallpaperCommand::new(
            "swaymsg",
            &["output", "*", "bg", path, "fit"],
        )],
        DesktopEnvironment::I3 => vec![WallpaperCommand::new("feh", &["--bg-max", path])],
        DesktopEnvironment::MacOs => {
            let script = format!(
                "tell application \"System Events\" to tell every desktop to set picture to \"{path}\""
            );
            vec![WallpaperCommand::new("osascript", &["-e", script.as_str()])]
        }
        DesktopEnvironment::Windows | DesktopEnvironment::Unknown(_) => return None,
    };
    Some(cmds)
}

/// Sets `image` as the wallpaper of the detected desktop environment.
pub fn set_background(image: &Path) -> Goes16Result<()> {
    set_background_for(&DesktopEnvironment::detect(), image)
}

pub fn set_background_for(env: &DesktopEnvironment, image: &Path) -> Goes16Result<()> {
    let image = std::path::absolute(image)
        .with_context(|| format!("resolve '{}'", image.display()))?;
    let cmds = wallpaper_commands(env, &image).ok_or_else(|| {
        Goes16Error::unsupported_environment(format!(
            "your desktop environment '{env}' is not supported"
        ))
    })?;

    for cmd in &cmds {
        match cmd.run() {
            Ok(()) => {}
            Err(e) if !cmd.required => warn!("optional wallpaper command failed: {e:#}"),
            Err(e) => {
                return Err(Goes16Error::unsupported_environment(format!(
                    "setting the wallpaper on '{env}' failed: {e:#}"
                )));
            }
        }
    }
    info!("Wallpaper set on '{env}'.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gnome_family_uses_file_uris() {
        let cmds =
            wallpaper_commands(&DesktopEnvironment::Gnome, Path::new("/tmp/goes16-x.png")).unwrap();
        assert_eq!(cmds[0].program, "gsettings");
        assert_eq!(
            cmds[0].args,
            [
                "set",
                "org.gnome.desktop.background",
                "picture-uri",
                "file:///tmp/goes16-x.png"
            ]
        );
        assert!(cmds[0].required);
        assert!(cmds[1..].iter().all(|c| !c.required));
    }

    #[test]
    fn plain_path_environments() {
        let img = Path::new("/tmp/goes16-x.png");
        let mate = wallpaper_commands(&DesktopEnvironment::Mate, img).unwrap();
        assert_eq!(mate[0].args.last().unwrap(), "/tmp/goes16-x.png");

        let sway = wallpaper_commands(&DesktopEnvironment::Sway, img).unwrap();
        assert_eq!(sway[0].program, "swaymsg");
        assert!(sway[0].args.contains(&"/tmp/goes16-x.png".to_string()));

        let mac = wallpaper_commands(&DesktopEnvironment::MacOs, img).unwrap();
        assert!(mac[0].args[1].contains("\"/tmp/goes16-x.png\""));
    }

    #[test]
    fn unknown_environment_is_unsupported() {
        let env = DesktopEnvironment::Unknown("Enlightenment".to_string());
        assert!(wallpaper_commands(&env, Path::new("/tmp/x.png")).is_none());

        let err = set_background_for(&env, Path::new("/tmp/x.png")).unwrap_err();
        assert!(matches!(err, Goes16Error::UnsupportedEnvironment(_)));
        assert!(err.to_string().contains("'Enlightenment' is not supported"));
    }
}
