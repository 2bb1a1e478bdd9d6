use std::process::Command;

/// Platform identifier reported to the UI (`win32`, `darwin`, `linux`, ...).
pub fn platform_name() -> &'static str {
    match std::env::consts::OS {
        "windows" => "win32",
        "macos" => "darwin",
        other => other,
    }
}

#[cfg(target_os = "windows")]
pub(crate) fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;

    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW);
}

#[cfg(unix)]
pub(crate) fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    // A fresh process group keeps terminal signals aimed at the launcher away from the game.
    command.process_group(0);
}

#[cfg(not(any(unix, target_os = "windows")))]
pub(crate) fn detach(_command: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_os = "linux")]
    fn linux_reports_linux() {
        assert_eq!(platform_name(), "linux");
    }

    #[test]
    #[cfg(target_os = "windows")]
    fn windows_reports_win32() {
        assert_eq!(platform_name(), "win32");
    }
}
