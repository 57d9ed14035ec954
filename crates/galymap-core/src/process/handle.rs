#![cfg_attr(not(target_os = "windows"), allow(dead_code))]

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};
use crate::process::provider::ProcessInfo;

#[cfg(target_os = "windows")]
use tracing::{debug, info, warn};
#[cfg(target_os = "windows")]
use windows::Win32::Foundation::{CloseHandle, HANDLE};
#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::ToolHelp::{
    CREATE_TOOLHELP_SNAPSHOT_FLAGS, CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW,
    Module32NextW, PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPMODULE,
    TH32CS_SNAPMODULE32, TH32CS_SNAPPROCESS,
};
#[cfg(target_os = "windows")]
use windows::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, PROCESS_ACCESS_RIGHTS, PROCESS_QUERY_INFORMATION,
    PROCESS_VM_OPERATION, PROCESS_VM_READ, PROCESS_VM_WRITE,
};

/// Executable name of the game client.
pub const PROCESS_NAME: &str = "D2R.exe";

/// An open handle to the game process.
///
/// Once [`close`](ProcessHandle::close) has been called every access through
/// this handle fails immediately instead of touching a stale OS handle.
#[cfg(target_os = "windows")]
pub struct ProcessHandle {
    handle: HANDLE,
    closed: AtomicBool,
    pub pid: u32,
    pub base_address: u64,
    pub module_size: u32,
}

#[cfg(not(target_os = "windows"))]
pub struct ProcessHandle {
    closed: AtomicBool,
    pub pid: u32,
    pub base_address: u64,
    pub module_size: u32,
}

impl ProcessHandle {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(target_os = "windows")]
const ACCESS: PROCESS_ACCESS_RIGHTS = PROCESS_ACCESS_RIGHTS(
    PROCESS_QUERY_INFORMATION.0 | PROCESS_VM_READ.0 | PROCESS_VM_WRITE.0 | PROCESS_VM_OPERATION.0,
);

#[cfg(target_os = "windows")]
impl ProcessHandle {
    /// Open the first running process named `exe_name`, using its module of the same name.
    pub fn find_and_open(exe_name: &str) -> Result<Self> {
        let pid = find_process_id(exe_name)?;
        debug!("Found {} with PID {}", exe_name, pid);
        Self::attach_module(pid, Some(exe_name))
    }

    /// Open `pid`, using the process image as the scanned module.
    pub fn open(pid: u32) -> Result<Self> {
        Self::attach_module(pid, None)
    }

    fn attach_module(pid: u32, module_name: Option<&str>) -> Result<Self> {
        let module = find_module(pid, module_name)?;

        // SAFETY: OpenProcess takes plain flags and a PID. The returned handle is
        // owned by this struct and released exactly once in close().
        let handle = unsafe { OpenProcess(ACCESS, false, pid) }
            .map_err(|e| Error::ProcessOpenFailed(format!("PID {}: {}", pid, e)))?;

        info!(
            "Attached to PID {} ({} at {:#x}, {:#x} bytes)",
            pid, module.name, module.base, module.size
        );
        Ok(Self {
            handle,
            closed: AtomicBool::new(false),
            pid,
            base_address: module.base,
            module_size: module.size,
        })
    }

    pub fn handle(&self) -> HANDLE {
        self.handle
    }

    /// Release the OS handle. Later reads and writes fail fast.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) || self.handle.is_invalid() {
            return;
        }
        // SAFETY: the swap above lets this run at most once for a handle from OpenProcess.
        if let Err(e) = unsafe { CloseHandle(self.handle) } {
            warn!("Failed to close process handle: {}", e);
        }
    }

    pub fn is_alive(&self) -> bool {
        const STILL_ACTIVE: u32 = 259;

        if self.is_closed() {
            return false;
        }
        let mut exit_code = 0u32;
        // SAFETY: the handle has not been closed (checked above).
        let queried = unsafe { GetExitCodeProcess(self.handle, &mut exit_code) };
        queried.is_ok() && exit_code == STILL_ACTIVE
    }
}

#[cfg(target_os = "windows")]
impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(not(target_os = "windows"))]
impl ProcessHandle {
    pub fn find_and_open(_exe_name: &str) -> Result<Self> {
        Err(Error::ProcessNotFound(
            "Windows only: process access not supported on this platform".to_string(),
        ))
    }

    pub fn open(_pid: u32) -> Result<Self> {
        Err(Error::ProcessNotFound(
            "Windows only: process access not supported on this platform".to_string(),
        ))
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Check if the process is still running (stub for non-Windows)
    pub fn is_alive(&self) -> bool {
        false
    }
}

impl ProcessInfo for ProcessHandle {
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
        ProcessHandle::is_alive(self)
    }
}

/// A ToolHelp snapshot handle, closed on drop.
#[cfg(target_os = "windows")]
struct ToolhelpSnapshot(HANDLE);

#[cfg(target_os = "windows")]
impl ToolhelpSnapshot {
    fn take(flags: CREATE_TOOLHELP_SNAPSHOT_FLAGS, pid: u32) -> windows::core::Result<Self> {
        // SAFETY: CreateToolhelp32Snapshot has no preconditions; the guard owns the handle.
        unsafe { CreateToolhelp32Snapshot(flags, pid) }.map(Self)
    }
}

#[cfg(target_os = "windows")]
impl Drop for ToolhelpSnapshot {
    fn drop(&mut self) {
        // SAFETY: the handle came from CreateToolhelp32Snapshot and is closed only here.
        let _ = unsafe { CloseHandle(self.0) };
    }
}

#[cfg(target_os = "windows")]
struct ModuleEntry {
    name: String,
    base: u64,
    size: u32,
}

#[cfg(target_os = "windows")]
fn wide_to_string(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}

#[cfg(target_os = "windows")]
fn find_process_id(exe_name: &str) -> Result<u32> {
    let snapshot = ToolhelpSnapshot::take(TH32CS_SNAPPROCESS, 0)
        .map_err(|e| Error::ProcessNotFound(e.to_string()))?;
    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    // SAFETY: valid snapshot handle and an entry with dwSize set.
    let mut more = unsafe { Process32FirstW(snapshot.0, &mut entry) }.is_ok();
    while more {
        if wide_to_string(&entry.szExeFile).eq_ignore_ascii_case(exe_name) {
            return Ok(entry.th32ProcessID);
        }
        // SAFETY: as above.
        more = unsafe { Process32NextW(snapshot.0, &mut entry) }.is_ok();
    }

    Err(Error::ProcessNotFound(format!(
        "Process '{}' not found",
        exe_name
    )))
}

/// The module named `name`, or the process image (always listed first) when `None`.
#[cfg(target_os = "windows")]
fn find_module(pid: u32, name: Option<&str>) -> Result<ModuleEntry> {
    let snapshot = ToolhelpSnapshot::take(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid)
        .map_err(|e| {
            Error::ProcessOpenFailed(format!("Failed to list modules of PID {}: {}", pid, e))
        })?;
    let mut entry = MODULEENTRY32W {
        dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
        ..Default::default()
    };

    // SAFETY: valid snapshot handle and an entry with dwSize set.
    let mut more = unsafe { Module32FirstW(snapshot.0, &mut entry) }.is_ok();
    while more {
        let module_name = wide_to_string(&entry.szModule);
        if name.is_none_or(|name| module_name.eq_ignore_ascii_case(name)) {
            return Ok(ModuleEntry {
                name: module_name,
                base: entry.modBaseAddr as u64,
                size: entry.modBaseSize,
            });
        }
        // SAFETY: as above.
        more = unsafe { Module32NextW(snapshot.0, &mut entry) }.is_ok();
    }

    Err(Error::ProcessOpenFailed(format!(
        "Module '{}' not found in PID {}",
        name.unwrap_or("<image>"),
        pid
    )))
}
