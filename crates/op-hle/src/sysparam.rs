//! System parameter queries (sceUtilityGetSystemParam*)
//!
//! Answers come from the emulator [`Config`]; the firmware flash storage
//! behind these never exists. A couple of per-game compat switches bend
//! the answers the same way the console settings screen can't.

use op_core::config::{
    Config, PSP_BUTTON_PREFERENCE_CIRCLE, PSP_LANGUAGE_ENGLISH, PSP_LANGUAGE_JAPANESE,
    PSP_TIME_FORMAT_12HR, PSP_TIME_FORMAT_24HR,
};
use op_memory::GuestMemory;
use tracing::{debug, error, warn};

use crate::errors::{
    SCE_ERROR_UTILITY_INVALID_ADHOC_CHANNEL, SCE_ERROR_UTILITY_INVALID_SYSTEM_PARAM_ID,
    SCE_ERROR_UTILITY_STRING_TOO_LONG,
};

pub const PSP_SYSTEMPARAM_ID_STRING_NICKNAME: u32 = 1;
pub const PSP_SYSTEMPARAM_ID_INT_ADHOC_CHANNEL: u32 = 2;
pub const PSP_SYSTEMPARAM_ID_INT_WLAN_POWERSAVE: u32 = 3;
pub const PSP_SYSTEMPARAM_ID_INT_DATE_FORMAT: u32 = 4;
pub const PSP_SYSTEMPARAM_ID_INT_TIME_FORMAT: u32 = 5;
pub const PSP_SYSTEMPARAM_ID_INT_TIMEZONE: u32 = 6;
pub const PSP_SYSTEMPARAM_ID_INT_DAYLIGHTSAVINGS: u32 = 7;
pub const PSP_SYSTEMPARAM_ID_INT_LANGUAGE: u32 = 8;
pub const PSP_SYSTEMPARAM_ID_INT_BUTTON_PREFERENCE: u32 = 9;
pub const PSP_SYSTEMPARAM_ID_INT_LOCK_PARENTAL_LEVEL: u32 = 10;

pub const PSP_SYSTEMPARAM_ADHOC_CHANNEL_AUTOMATIC: u32 = 0;

/// Status the real firmware returns when the adhoc channel is on
/// automatic; games treat it as "ask again later", not a failure.
pub const ADHOC_CHANNEL_AUTO_STATUS: i32 = 0x0800_ADF4;

/// sceUtilityGetSystemParamInt
pub fn get_int(config: &Config, mem: &mut GuestMemory, id: u32, dest_addr: u32) -> i32 {
    let sys = &config.system;
    let param: u32 = match id {
        PSP_SYSTEMPARAM_ID_INT_ADHOC_CHANNEL => {
            if sys.adhoc_channel == PSP_SYSTEMPARAM_ADHOC_CHANNEL_AUTOMATIC {
                // Real hardware reports this odd status for automatic
                // channel selection and still writes the value out.
                if let Err(e) = mem.write_u32(dest_addr, sys.adhoc_channel) {
                    error!("system param writeback failed: {}", e);
                    return -1;
                }
                return ADHOC_CHANNEL_AUTO_STATUS;
            }
            sys.adhoc_channel
        }
        PSP_SYSTEMPARAM_ID_INT_WLAN_POWERSAVE => u32::from(sys.wlan_power_save),
        PSP_SYSTEMPARAM_ID_INT_DATE_FORMAT => sys.date_format,
        PSP_SYSTEMPARAM_ID_INT_TIME_FORMAT => {
            if sys.time_format == PSP_TIME_FORMAT_12HR {
                PSP_TIME_FORMAT_12HR
            } else {
                PSP_TIME_FORMAT_24HR
            }
        }
        PSP_SYSTEMPARAM_ID_INT_TIMEZONE => sys.timezone as u32,
        PSP_SYSTEMPARAM_ID_INT_DAYLIGHTSAVINGS => u32::from(sys.daylight_savings),
        PSP_SYSTEMPARAM_ID_INT_LANGUAGE => {
            let mut lang = sys.language;
            // Some games crash on languages their font data lacks
            if config.compat.english_or_japanese_only
                && lang != PSP_LANGUAGE_ENGLISH
                && lang != PSP_LANGUAGE_JAPANESE
            {
                lang = PSP_LANGUAGE_ENGLISH;
            }
            lang
        }
        PSP_SYSTEMPARAM_ID_INT_BUTTON_PREFERENCE => {
            if config.compat.force_circle_confirm {
                PSP_BUTTON_PREFERENCE_CIRCLE
            } else {
                sys.button_preference
            }
        }
        PSP_SYSTEMPARAM_ID_INT_LOCK_PARENTAL_LEVEL => sys.lock_parental_level,
        _ => {
            warn!("get of unknown system param int {}", id);
            return SCE_ERROR_UTILITY_INVALID_SYSTEM_PARAM_ID as i32;
        }
    };

    if let Err(e) = mem.write_u32(dest_addr, param) {
        error!("system param writeback failed: {}", e);
        return -1;
    }
    debug!("system param int {} = 0x{:08x}", id, param);
    0
}

/// sceUtilitySetSystemParamInt. Only the adhoc channel and WLAN power
/// save are settable, and nothing persists.
pub fn set_int(id: u32, value: u32) -> i32 {
    match id {
        PSP_SYSTEMPARAM_ID_INT_ADHOC_CHANNEL => {
            if !matches!(value, 0 | 1 | 6 | 11) {
                return SCE_ERROR_UTILITY_INVALID_ADHOC_CHANNEL as i32;
            }
            0
        }
        PSP_SYSTEMPARAM_ID_INT_WLAN_POWERSAVE => 0,
        _ => SCE_ERROR_UTILITY_INVALID_SYSTEM_PARAM_ID as i32,
    }
}

/// sceUtilityGetSystemParamString
pub fn get_string(config: &Config, mem: &mut GuestMemory, id: u32, dest_addr: u32, dest_size: u32) -> i32 {
    if !mem.is_valid_range(dest_addr, dest_size) {
        return -1;
    }
    match id {
        PSP_SYSTEMPARAM_ID_STRING_NICKNAME => {
            let nickname = &config.system.nickname;
            // No room for the terminator means failure, not truncation
            if dest_size as usize <= nickname.len() {
                return SCE_ERROR_UTILITY_STRING_TOO_LONG as i32;
            }
            if let Err(e) = mem.write_fixed_str(dest_addr, nickname, dest_size) {
                error!("nickname writeback failed: {}", e);
                return -1;
            }
            0
        }
        _ => SCE_ERROR_UTILITY_INVALID_SYSTEM_PARAM_ID as i32,
    }
}

/// sceUtilitySetSystemParamString never persists anything on hardware
/// either; log and accept.
pub fn set_string(id: u32, str_addr: u32) -> i32 {
    warn!("set of system param string {} from 0x{:08x} ignored", id, str_addr);
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_memory::USER_MEM_BASE;

    fn fixture() -> (Config, GuestMemory) {
        (Config::default(), GuestMemory::new())
    }

    #[test]
    fn test_get_language() {
        let (config, mut mem) = fixture();
        let addr = USER_MEM_BASE;
        assert_eq!(get_int(&config, &mut mem, PSP_SYSTEMPARAM_ID_INT_LANGUAGE, addr), 0);
        assert_eq!(mem.read_u32(addr).unwrap(), config.system.language);
    }

    #[test]
    fn test_language_compat_clamp() {
        let (mut config, mut mem) = fixture();
        config.system.language = 5; // Spanish
        config.compat.english_or_japanese_only = true;
        let addr = USER_MEM_BASE;
        assert_eq!(get_int(&config, &mut mem, PSP_SYSTEMPARAM_ID_INT_LANGUAGE, addr), 0);
        assert_eq!(mem.read_u32(addr).unwrap(), PSP_LANGUAGE_ENGLISH);
    }

    #[test]
    fn test_adhoc_auto_channel_status() {
        let (mut config, mut mem) = fixture();
        config.system.adhoc_channel = PSP_SYSTEMPARAM_ADHOC_CHANNEL_AUTOMATIC;
        let addr = USER_MEM_BASE;
        assert_eq!(
            get_int(&config, &mut mem, PSP_SYSTEMPARAM_ID_INT_ADHOC_CHANNEL, addr),
            ADHOC_CHANNEL_AUTO_STATUS
        );
        assert_eq!(mem.read_u32(addr).unwrap(), 0);
    }

    #[test]
    fn test_set_adhoc_channel_validation() {
        assert_eq!(set_int(PSP_SYSTEMPARAM_ID_INT_ADHOC_CHANNEL, 6), 0);
        assert_eq!(
            set_int(PSP_SYSTEMPARAM_ID_INT_ADHOC_CHANNEL, 3),
            SCE_ERROR_UTILITY_INVALID_ADHOC_CHANNEL as i32
        );
    }

    #[test]
    fn test_unknown_id_rejected() {
        let (config, mut mem) = fixture();
        assert_eq!(
            get_int(&config, &mut mem, 99, USER_MEM_BASE),
            SCE_ERROR_UTILITY_INVALID_SYSTEM_PARAM_ID as i32
        );
        assert_eq!(set_int(99, 0), SCE_ERROR_UTILITY_INVALID_SYSTEM_PARAM_ID as i32);
    }

    #[test]
    fn test_nickname_round_trip() {
        let (config, mut mem) = fixture();
        let addr = USER_MEM_BASE;
        assert_eq!(
            get_string(&config, &mut mem, PSP_SYSTEMPARAM_ID_STRING_NICKNAME, addr, 32),
            0
        );
        assert_eq!(mem.read_cstring(addr, 32).unwrap(), config.system.nickname);
    }

    #[test]
    fn test_nickname_too_long_for_buffer() {
        let (config, mut mem) = fixture();
        // "Player" needs 7 bytes with the terminator
        let len = config.system.nickname.len() as u32;
        assert_eq!(
            get_string(&config, &mut mem, PSP_SYSTEMPARAM_ID_STRING_NICKNAME, USER_MEM_BASE, len),
            SCE_ERROR_UTILITY_STRING_TOO_LONG as i32
        );
    }
}
