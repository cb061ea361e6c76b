//! Platform-specific shell detection.

use std::path::PathBuf;

/// Shell used to run step commands, and the flag that passes a command to it.
///
/// Always `/bin/sh -c` on unix; `$SHELL` and rc files are not consulted.
pub fn shell_program() -> (PathBuf, &'static str) {
    if cfg!(target_os = "windows") {
        let comspec = std::env::var("COMSPEC")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("cmd.exe"));
        (comspec, "/C")
    } else {
        (PathBuf::from("/bin/sh"), "-c")
    }
}

/// Check if running in a CI environment.
///
/// Used to pick the non-interactive UI in `main()`.
/// Checks common CI environment variables: `CI`, `GITHUB_ACTIONS`,
/// `GITLAB_CI`, `CIRCLECI`, `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}

/// Check if running as root/admin.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() is a simple syscall that returns the effective user ID
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(windows)]
    {
        std::env::var("ADMIN").is_ok()
    }

    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_program_is_not_empty() {
        let (shell, flag) = shell_program();
        assert!(!shell.as_os_str().is_empty());
        assert!(!flag.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unix_uses_posix_sh() {
        let (shell, flag) = shell_program();
        assert_eq!(shell, PathBuf::from("/bin/sh"));
        assert_eq!(flag, "-c");
    }

    #[test]
    fn is_ci_detects_environment() {
        // Just ensure function doesn't panic
        let _ = is_ci();
    }

    #[test]
    fn is_elevated_does_not_panic() {
        let _ = is_elevated();
    }
}
