//! Net configuration parameter emulation (sceUtilityGetNetParam family)
//!
//! The console stores infrastructure profiles in flash; we fabricate a
//! single plausible profile so connection tests and config browsers see
//! something. Games mostly read the name and move on.

use op_memory::GuestMemory;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::errors::{SCE_ERROR_NETPARAM_BAD_NETCONF, SCE_ERROR_NETPARAM_BAD_PARAM};

pub const PSP_NETPARAM_NAME: u32 = 0;
pub const PSP_NETPARAM_SSID: u32 = 1;
pub const PSP_NETPARAM_SECURE: u32 = 2;
pub const PSP_NETPARAM_WEPKEY: u32 = 3;
pub const PSP_NETPARAM_IS_STATIC_IP: u32 = 4;
pub const PSP_NETPARAM_IP: u32 = 5;
pub const PSP_NETPARAM_NETMASK: u32 = 6;
pub const PSP_NETPARAM_ROUTE: u32 = 7;
pub const PSP_NETPARAM_MANUAL_DNS: u32 = 8;
pub const PSP_NETPARAM_PRIMARYDNS: u32 = 9;
pub const PSP_NETPARAM_SECONDARYDNS: u32 = 10;
pub const PSP_NETPARAM_PROXY_USER: u32 = 11;
pub const PSP_NETPARAM_PROXY_PASS: u32 = 12;
pub const PSP_NETPARAM_USE_PROXY: u32 = 13;
pub const PSP_NETPARAM_PROXY_SERVER: u32 = 14;
pub const PSP_NETPARAM_PROXY_PORT: u32 = 15;
pub const PSP_NETPARAM_VERSION: u32 = 16;
pub const PSP_NETPARAM_UNKNOWN: u32 = 17;
pub const PSP_NETPARAM_8021X_AUTH_TYPE: u32 = 18;
pub const PSP_NETPARAM_8021X_USER: u32 = 19;
pub const PSP_NETPARAM_8021X_PASS: u32 = 20;
pub const PSP_NETPARAM_WPA_TYPE: u32 = 21;
pub const PSP_NETPARAM_WPA_KEY: u32 = 22;
pub const PSP_NETPARAM_BROWSER: u32 = 23;
pub const PSP_NETPARAM_WIFI_CONFIG: u32 = 24;

const PROFILE_NAME_LEN: u32 = 64;
const SSID_LEN: u32 = 32;
const IPADDR_LEN: u32 = 16;
const URL_LEN: u32 = 128;
const USERPASS_LEN: u32 = 255;
const WEPKEY_LEN: u32 = 5;
const WPAKEY_LEN: u32 = 63;

/// How many profiles the fake flash holds
const DUMMY_ENTRY_COUNT: i32 = 1;

/// State behind the net configuration syscalls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParamState {
    /// Profile id a conf id of 0 aliases to
    pub latest_id: i32,
}

impl Default for NetParamState {
    fn default() -> Self {
        Self { latest_id: 1 }
    }
}

impl NetParamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// sceUtilityCheckNetParam: does configuration `id` exist?
    pub fn check(&self, id: i32) -> i32 {
        let available = (0..=24).contains(&id) && id <= DUMMY_ENTRY_COUNT;
        if available {
            0
        } else {
            debug!("net config {} does not exist", id);
            SCE_ERROR_NETPARAM_BAD_NETCONF as i32
        }
    }

    /// sceUtilityGetNetParamLatestID
    pub fn latest_id_into(&self, mem: &mut GuestMemory, id_addr: u32) -> i32 {
        if let Err(e) = mem.write_u32(id_addr, self.latest_id as u32) {
            error!("latest net config id writeback failed: {}", e);
            return -1;
        }
        0
    }

    /// sceUtilityGetNetParam: copy one field of profile `id` (0 aliases
    /// the latest profile) into guest memory.
    pub fn get(&self, mem: &mut GuestMemory, id: i32, param: u32, data_addr: u32) -> i32 {
        if !(0..=24).contains(&id) {
            warn!("get net param with invalid config id {}", id);
            return SCE_ERROR_NETPARAM_BAD_NETCONF as i32;
        }
        let effective_id = if id == 0 { self.latest_id } else { id };

        let write_str = |mem: &mut GuestMemory, s: &str, len: u32| -> i32 {
            if !mem.is_valid_range(data_addr, len) {
                return -1;
            }
            match mem.write_fixed_str(data_addr, s, len) {
                Ok(()) => 0,
                Err(_) => -1,
            }
        };
        let write_u32 = |mem: &mut GuestMemory, value: u32| -> i32 {
            match mem.write_u32(data_addr, value) {
                Ok(()) => 0,
                Err(_) => -1,
            }
        };

        let ret = match param {
            PSP_NETPARAM_NAME => {
                write_str(mem, &format!("NetConf{}", effective_id), PROFILE_NAME_LEN)
            }
            PSP_NETPARAM_SSID => write_str(mem, "HomeAP", SSID_LEN),
            // WEP 64-bit
            PSP_NETPARAM_SECURE => write_u32(mem, 1),
            PSP_NETPARAM_WEPKEY => write_str(mem, "XXXXX", WEPKEY_LEN),
            // Static addressing, manual DNS: the fixed answers below
            // only make sense if the profile claims manual settings
            PSP_NETPARAM_IS_STATIC_IP => write_u32(mem, 1),
            PSP_NETPARAM_IP => write_str(mem, "192.168.0.10", IPADDR_LEN),
            PSP_NETPARAM_NETMASK => write_str(mem, "255.255.255.0", IPADDR_LEN),
            PSP_NETPARAM_ROUTE => write_str(mem, "192.168.0.1", IPADDR_LEN),
            PSP_NETPARAM_MANUAL_DNS => write_u32(mem, 1),
            PSP_NETPARAM_PRIMARYDNS => write_str(mem, "8.8.8.8", IPADDR_LEN),
            PSP_NETPARAM_SECONDARYDNS => write_str(mem, "8.8.4.4", IPADDR_LEN),
            PSP_NETPARAM_PROXY_USER | PSP_NETPARAM_PROXY_PASS => {
                write_str(mem, "user", USERPASS_LEN)
            }
            PSP_NETPARAM_USE_PROXY => write_u32(mem, 0),
            PSP_NETPARAM_PROXY_SERVER => write_str(mem, "", URL_LEN),
            PSP_NETPARAM_PROXY_PORT => {
                if !mem.is_valid_range(data_addr, 2) {
                    -1
                } else {
                    match mem.write_u16(data_addr, 0) {
                        Ok(()) => 0,
                        Err(_) => -1,
                    }
                }
            }
            // "New version" profile layout
            PSP_NETPARAM_VERSION => write_u32(mem, 2),
            PSP_NETPARAM_UNKNOWN => write_u32(mem, 0),
            PSP_NETPARAM_8021X_AUTH_TYPE => write_u32(mem, 0),
            PSP_NETPARAM_8021X_USER | PSP_NETPARAM_8021X_PASS => {
                write_str(mem, "user", USERPASS_LEN)
            }
            // ASCII passphrase
            PSP_NETPARAM_WPA_TYPE => write_u32(mem, 1),
            PSP_NETPARAM_WPA_KEY => write_str(mem, "XXXXXXXX", WPAKEY_LEN),
            PSP_NETPARAM_BROWSER => write_u32(mem, 0),
            PSP_NETPARAM_WIFI_CONFIG => write_u32(mem, 0),
            _ => {
                warn!("get of unknown net param {}", param);
                return SCE_ERROR_NETPARAM_BAD_PARAM as i32;
            }
        };
        if ret == 0 {
            debug!("net param {} of config {} read", param, effective_id);
        }
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_memory::USER_MEM_BASE;

    #[test]
    fn test_check_existing_and_missing() {
        let state = NetParamState::new();
        assert_eq!(state.check(0), 0);
        assert_eq!(state.check(1), 0);
        assert_eq!(state.check(2), SCE_ERROR_NETPARAM_BAD_NETCONF as i32);
        assert_eq!(state.check(-1), SCE_ERROR_NETPARAM_BAD_NETCONF as i32);
        assert_eq!(state.check(25), SCE_ERROR_NETPARAM_BAD_NETCONF as i32);
    }

    #[test]
    fn test_id_zero_aliases_latest() {
        let state = NetParamState::new();
        let mut mem = GuestMemory::new();
        let addr = USER_MEM_BASE;
        assert_eq!(state.get(&mut mem, 0, PSP_NETPARAM_NAME, addr), 0);
        assert_eq!(
            mem.read_cstring(addr, PROFILE_NAME_LEN).unwrap(),
            "NetConf1"
        );
    }

    #[test]
    fn test_bad_param_rejected() {
        let state = NetParamState::new();
        let mut mem = GuestMemory::new();
        assert_eq!(
            state.get(&mut mem, 1, 99, USER_MEM_BASE),
            SCE_ERROR_NETPARAM_BAD_PARAM as i32
        );
    }

    #[test]
    fn test_latest_id_writeback() {
        let state = NetParamState::new();
        let mut mem = GuestMemory::new();
        let addr = USER_MEM_BASE;
        assert_eq!(state.latest_id_into(&mut mem, addr), 0);
        assert_eq!(mem.read_u32(addr).unwrap(), 1);
    }

    #[test]
    fn test_proxy_port_is_u16() {
        let state = NetParamState::new();
        let mut mem = GuestMemory::new();
        let addr = USER_MEM_BASE;
        // Poison the following bytes to prove only two are written
        mem.write_u32(addr, 0xFFFF_FFFF).unwrap();
        assert_eq!(state.get(&mut mem, 1, PSP_NETPARAM_PROXY_PORT, addr), 0);
        assert_eq!(mem.read_u16(addr).unwrap(), 0);
        assert_eq!(mem.read_u16(addr + 2).unwrap(), 0xFFFF);
    }
}
