//! SCE status codes returned by the utility syscall surface.
//!
//! These are raw firmware constants; keep the hex values exactly as the
//! real kernel reports them.

pub const SCE_ERROR_UTILITY_INVALID_STATUS: u32 = 0x8011_0001;
pub const SCE_ERROR_UTILITY_WRONG_TYPE: u32 = 0x8011_0005;
pub const SCE_ERROR_UTILITY_STRING_TOO_LONG: u32 = 0x8011_0102;
pub const SCE_ERROR_UTILITY_INVALID_SYSTEM_PARAM_ID: u32 = 0x8011_0103;
pub const SCE_ERROR_UTILITY_INVALID_ADHOC_CHANNEL: u32 = 0x8011_0104;

pub const SCE_ERROR_NETPARAM_BAD_NETCONF: u32 = 0x8011_0601;
pub const SCE_ERROR_NETPARAM_BAD_PARAM: u32 = 0x8011_0604;

pub const SCE_ERROR_AV_MODULE_BAD_ID: u32 = 0x8011_0F01;

pub const SCE_ERROR_MODULE_BAD_ID: u32 = 0x8011_1101;
pub const SCE_ERROR_MODULE_ALREADY_LOADED: u32 = 0x8011_1102;
pub const SCE_ERROR_MODULE_NOT_LOADED: u32 = 0x8011_1103;

pub const SCE_KERNEL_ERROR_LIBRARY_NOTFOUND: u32 = 0x8002_013C;
pub const SCE_KERNEL_ERROR_OUT_OF_MEMORY: u32 = 0x8002_0190;
