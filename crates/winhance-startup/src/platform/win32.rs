use windows::{
    Win32::{
        Foundation::{BOOL, ERROR_CANCELLED, HANDLE, HWND, LPARAM},
        Security::{
            CheckTokenMembership, CreateWellKnownSid, PSID, SECURITY_MAX_SID_SIZE,
            WinBuiltinAdministratorsSid,
        },
        UI::{
            Shell::{SEE_MASK_NOASYNC, SHELLEXECUTEINFOW, ShellExecuteExW},
            WindowsAndMessaging::{
                EnumWindows, GetWindowThreadProcessId, IsIconic, IsWindowVisible, SW_RESTORE,
                SW_SHOWNORMAL, SetForegroundWindow, ShowWindow,
            },
        },
    },
    core::{PCWSTR, w},
};

use super::{ElevationBackend, RelaunchRequest, WindowActivator, join_args};
use crate::error::PlatformError;

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(Some(0)).collect()
}

struct WindowSearch {
    pid: u32,
    found: Option<HWND>,
}

unsafe extern "system" fn match_process_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let search = unsafe { &mut *(lparam.0 as *mut WindowSearch) };
    let mut owner_pid = 0u32;
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut owner_pid as *mut u32)) };
    if owner_pid == search.pid && unsafe { IsWindowVisible(hwnd) }.as_bool() {
        search.found = Some(hwnd);
        return BOOL(0);
    }
    BOOL(1)
}

/// First visible top-level window owned by `pid`.
fn main_window_of(pid: u32) -> Option<HWND> {
    let mut search = WindowSearch { pid, found: None };
    // EnumWindows reports an error when the callback stops early
    let _ = unsafe {
        EnumWindows(
            Some(match_process_window),
            LPARAM(&mut search as *mut WindowSearch as isize),
        )
    };
    search.found
}

pub(super) struct Win32WindowActivator;

impl WindowActivator for Win32WindowActivator {
    fn restore(&self, pid: u32) -> Result<bool, PlatformError> {
        let Some(hwnd) = main_window_of(pid) else {
            return Ok(false);
        };
        unsafe {
            if IsIconic(hwnd).as_bool() {
                let _ = ShowWindow(hwnd, SW_RESTORE);
            }
        }
        Ok(true)
    }

    fn focus(&self, pid: u32) -> Result<(), PlatformError> {
        if let Some(hwnd) = main_window_of(pid) {
            let _ = unsafe { SetForegroundWindow(hwnd) };
        }
        Ok(())
    }
}

pub(super) struct RunAsElevation;

impl ElevationBackend for RunAsElevation {
    fn is_elevated(&self) -> Result<bool, PlatformError> {
        unsafe {
            let mut sid_buffer = [0u8; SECURITY_MAX_SID_SIZE as usize];
            let mut sid_size = sid_buffer.len() as u32;
            let sid = PSID(sid_buffer.as_mut_ptr() as *mut _);

            CreateWellKnownSid(WinBuiltinAdministratorsSid, PSID::default(), sid, &mut sid_size)?;

            // a null token handle checks the calling thread's token
            let mut is_member = BOOL(0);
            CheckTokenMembership(HANDLE::default(), sid, &mut is_member)?;
            Ok(is_member.as_bool())
        }
    }

    fn relaunch_elevated(&self, request: &RelaunchRequest) -> Result<(), PlatformError> {
        let file = wide(&request.executable.to_string_lossy());
        let parameters = wide(&join_args(&request.args));
        let directory = wide(&request.working_dir.to_string_lossy());

        let mut info = SHELLEXECUTEINFOW {
            cbSize: std::mem::size_of::<SHELLEXECUTEINFOW>() as u32,
            fMask: SEE_MASK_NOASYNC,
            lpVerb: w!("runas"),
            lpFile: PCWSTR(file.as_ptr()),
            lpParameters: PCWSTR(parameters.as_ptr()),
            lpDirectory: PCWSTR(directory.as_ptr()),
            nShow: SW_SHOWNORMAL.0,
            ..Default::default()
        };

        match unsafe { ShellExecuteExW(&mut info) } {
            Ok(()) => Ok(()),
            Err(error) if error.code() == ERROR_CANCELLED.to_hresult() => {
                Err(PlatformError::ElevationDeclined)
            }
            Err(error) => Err(error.into()),
        }
    }
}
