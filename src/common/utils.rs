//! Small formatting helpers shared by the scheduler and the commands.

use std::path::Path;
use std::time::Duration;

/// Format a wait for humans: `5h12m`, `5h`, `42m`, `17s`.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        if minutes > 0 {
            format!("{hours}h{minutes}m")
        } else {
            format!("{hours}h")
        }
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    }
}

/// Replace the home directory prefix with `~` so logs don't leak user names.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h");
        assert_eq!(format_duration(Duration::from_secs(3660)), "1h1m");
        assert_eq!(format_duration(Duration::from_secs(1800)), "30m");
        assert_eq!(format_duration(Duration::from_secs(59)), "59s");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    #[test]
    fn test_private_path_outside_home_is_unchanged() {
        let path = PathBuf::from("/etc/daytime/daytime.toml");
        assert_eq!(private_path(&path), "/etc/daytime/daytime.toml");
    }

    #[test]
    fn test_private_path_hides_home() {
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".config").join("daytime");
            assert_eq!(private_path(&path), "~/.config/daytime");
        }
    }
}
