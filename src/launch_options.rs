use crate::{DEV_FLAG, STARTUP_FLAG};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LaunchOptions {
    /// Launched by the OS at login: window starts hidden in the tray.
    pub(crate) launched_at_login: bool,
    pub(crate) dev: bool,
}

impl LaunchOptions {
    pub(crate) fn from_env() -> Self {
        Self::from_args(std::env::args().skip(1))
    }

    pub(crate) fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        for arg in args {
            match arg.as_ref().trim() {
                STARTUP_FLAG => options.launched_at_login = true,
                DEV_FLAG => options.dev = true,
                _ => {}
            }
        }
        options
    }

    pub(crate) fn start_hidden(&self) -> bool {
        self.launched_at_login
    }
}
