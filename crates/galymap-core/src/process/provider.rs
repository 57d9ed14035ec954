//! Process provider abstraction for testability.
//!
//! Process discovery goes through [`ProcessProvider`] so attach logic can be
//! tested without a running game.

use crate::error::Result;
use crate::process::handle::{PROCESS_NAME, ProcessHandle};

/// Trait for accessing process information.
pub trait ProcessInfo {
    /// Get the process ID.
    fn pid(&self) -> u32;

    /// Get the base address of the main module.
    fn base_address(&self) -> u64;

    /// Get the size of the main module.
    fn module_size(&self) -> u32;

    /// Check if the process is still running.
    fn is_alive(&self) -> bool;
}

/// Trait for finding and opening processes.
pub trait ProcessProvider {
    /// The type of process info returned by this provider.
    type Process: ProcessInfo;

    /// Find and open the target game process.
    fn find_process(&self) -> Result<Self::Process>;

    /// Open a process by its PID.
    fn open_process(&self, pid: u32) -> Result<Self::Process>;

    /// Open `pid` if given, otherwise search by executable name.
    fn attach(&self, pid: Option<u32>) -> Result<Self::Process> {
        match pid {
            Some(pid) => self.open_process(pid),
            None => self.find_process(),
        }
    }
}

/// Finds the game among the running processes by executable name.
#[derive(Debug, Clone)]
pub struct SystemProcessProvider {
    exe_name: String,
}

impl SystemProcessProvider {
    pub fn new(exe_name: impl Into<String>) -> Self {
        Self {
            exe_name: exe_name.into(),
        }
    }

    pub fn exe_name(&self) -> &str {
        &self.exe_name
    }
}

impl Default for SystemProcessProvider {
    fn default() -> Self {
        Self::new(PROCESS_NAME)
    }
}

impl ProcessProvider for SystemProcessProvider {
    type Process = ProcessHandle;

    fn find_process(&self) -> Result<ProcessHandle> {
        ProcessHandle::find_and_open(&self.exe_name)
    }

    fn open_process(&self, pid: u32) -> Result<ProcessHandle> {
        ProcessHandle::open(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Mock process info for testing.
    #[derive(Clone)]
    pub struct MockProcessInfo {
        pub pid: u32,
        pub base_address: u64,
        pub module_size: u32,
        pub alive: bool,
    }

    impl ProcessInfo for MockProcessInfo {
        fn pid(&self) -> u32 {
            self.pid
        }

        fn base_address(&self) -> u64 {
            self.base_address
        }

        fn module_size(&self) -> u32 {
            self.module_size
        }

        fn is_alive(&self) -> bool {
            self.alive
        }
    }

    /// Mock process provider for testing.
    pub struct MockProcessProvider {
        pub process: Option<MockProcessInfo>,
    }

    impl ProcessProvider for MockProcessProvider {
        type Process = MockProcessInfo;

        fn find_process(&self) -> Result<Self::Process> {
            self.process
                .clone()
                .ok_or_else(|| Error::ProcessNotFound("Mock process not configured".to_string()))
        }

        fn open_process(&self, pid: u32) -> Result<Self::Process> {
            self.process
                .clone()
                .filter(|p| p.pid == pid)
                .ok_or_else(|| Error::ProcessNotFound(format!("Mock process {} not found", pid)))
        }
    }

    fn provider() -> MockProcessProvider {
        MockProcessProvider {
            process: Some(MockProcessInfo {
                pid: 1234,
                base_address: 0x140000000,
                module_size: 0x1000000,
                alive: true,
            }),
        }
    }

    #[test]
    fn test_attach_by_search() {
        let process = provider().attach(None).unwrap();
        assert_eq!(process.pid(), 1234);
        assert_eq!(process.base_address(), 0x140000000);
    }

    #[test]
    fn test_attach_by_pid() {
        assert_eq!(provider().attach(Some(1234)).unwrap().pid(), 1234);
        assert!(matches!(
            provider().attach(Some(9999)),
            Err(Error::ProcessNotFound(_))
        ));
    }

    #[test]
    fn test_provider_not_found() {
        let provider = MockProcessProvider { process: None };
        assert!(provider.find_process().is_err());
    }

    #[test]
    fn test_system_provider_default_name() {
        assert_eq!(SystemProcessProvider::default().exe_name(), "D2R.exe");
    }
}
