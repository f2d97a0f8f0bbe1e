//! sceUtility export table
//!
//! Maps the library's NIDs onto [`UtilityContext`] methods so a syscall
//! dispatcher can resolve guest imports. Entries with no handler are
//! real exports we have never seen a game depend on; calling one logs
//! and returns 0.

use tracing::warn;

use crate::utility::UtilityContext;
use crate::HleResult;

pub type UtilityHandler = fn(&mut UtilityContext, &[u32]) -> HleResult;

pub struct UtilityFunction {
    pub nid: u32,
    pub name: &'static str,
    pub handler: Option<UtilityHandler>,
}

fn arg(args: &[u32], index: usize) -> u32 {
    args.get(index).copied().unwrap_or(0)
}

fn iarg(args: &[u32], index: usize) -> i32 {
    arg(args, index) as i32
}

macro_rules! utility_exports {
    ($( { $nid:literal, $name:literal, $handler:expr } ),* $(,)?) => {
        pub static UTILITY_EXPORTS: &[UtilityFunction] = &[
            $( UtilityFunction { nid: $nid, name: $name, handler: $handler } ),*
        ];
    };
}

utility_exports![
    { 0x1579A159, "sceUtilityLoadNetModule", Some(|c, a| HleResult::new(c.load_net_module(arg(a, 0)))) },
    { 0x64D50C56, "sceUtilityUnloadNetModule", Some(|c, a| HleResult::new(c.unload_net_module(arg(a, 0)))) },

    { 0xF88155F6, "sceUtilityNetconfShutdownStart", Some(|c, _| c.netconf_shutdown_start()) },
    { 0x4DB1E739, "sceUtilityNetconfInitStart", Some(|c, a| c.netconf_init_start(arg(a, 0))) },
    { 0x91E70E35, "sceUtilityNetconfUpdate", Some(|c, a| HleResult::new(c.netconf_update(iarg(a, 0)))) },
    { 0x6332AA39, "sceUtilityNetconfGetStatus", Some(|c, _| HleResult::new(c.netconf_get_status())) },
    { 0x5EEE6548, "sceUtilityCheckNetParam", Some(|c, a| HleResult::new(c.check_net_param(iarg(a, 0)))) },
    { 0x434D4B3A, "sceUtilityGetNetParam", Some(|c, a| HleResult::new(c.get_net_param(iarg(a, 0), arg(a, 1), arg(a, 2)))) },
    { 0x4FED24D8, "sceUtilityGetNetParamLatestID", Some(|c, a| HleResult::new(c.get_net_param_latest_id(arg(a, 0)))) },

    { 0x67AF3428, "sceUtilityMsgDialogShutdownStart", Some(|c, _| c.msg_dialog_shutdown_start()) },
    { 0x2AD8E239, "sceUtilityMsgDialogInitStart", Some(|c, a| c.msg_dialog_init_start(arg(a, 0))) },
    { 0x95FC253B, "sceUtilityMsgDialogUpdate", Some(|c, a| c.msg_dialog_update(iarg(a, 0))) },
    { 0x9A1C91D7, "sceUtilityMsgDialogGetStatus", Some(|c, _| HleResult::new(c.msg_dialog_get_status())) },
    { 0x4928BD96, "sceUtilityMsgDialogAbort", Some(|c, _| HleResult::new(c.msg_dialog_abort())) },

    { 0x9790B33C, "sceUtilitySavedataShutdownStart", Some(|c, _| c.savedata_shutdown_start()) },
    { 0x50C4CD57, "sceUtilitySavedataInitStart", Some(|c, a| c.savedata_init_start(arg(a, 0))) },
    { 0xD4B95FFB, "sceUtilitySavedataUpdate", Some(|c, a| c.savedata_update(iarg(a, 0))) },
    { 0x8874DBE0, "sceUtilitySavedataGetStatus", Some(|c, _| HleResult::new(c.savedata_get_status())) },

    { 0x3DFAEBA9, "sceUtilityOskShutdownStart", Some(|c, _| c.osk_shutdown_start()) },
    { 0xF6269B82, "sceUtilityOskInitStart", Some(|c, a| c.osk_init_start(arg(a, 0))) },
    { 0x4B85C861, "sceUtilityOskUpdate", Some(|c, a| HleResult::new(c.osk_update(iarg(a, 0)))) },
    { 0xF3F76017, "sceUtilityOskGetStatus", Some(|c, _| HleResult::new(c.osk_get_status())) },

    { 0x41E30674, "sceUtilitySetSystemParamString", Some(|c, a| HleResult::new(c.set_system_param_string(arg(a, 0), arg(a, 1)))) },
    { 0x45C18506, "sceUtilitySetSystemParamInt", Some(|c, a| HleResult::new(c.set_system_param_int(arg(a, 0), arg(a, 1)))) },
    { 0x34B78343, "sceUtilityGetSystemParamString", Some(|c, a| HleResult::new(c.get_system_param_string(arg(a, 0), arg(a, 1), arg(a, 2)))) },
    { 0xA5DA2406, "sceUtilityGetSystemParamInt", Some(|c, a| HleResult::new(c.get_system_param_int(arg(a, 0), arg(a, 1)))) },

    { 0xC492F751, "sceUtilityGameSharingInitStart", Some(|c, a| HleResult::new(c.game_sharing_init_start(arg(a, 0)))) },
    { 0xEFC6F80F, "sceUtilityGameSharingShutdownStart", Some(|c, _| HleResult::new(c.game_sharing_shutdown_start())) },
    { 0x7853182D, "sceUtilityGameSharingUpdate", Some(|c, a| HleResult::new(c.game_sharing_update(iarg(a, 0)))) },
    { 0x946963F3, "sceUtilityGameSharingGetStatus", Some(|c, _| HleResult::new(c.game_sharing_get_status())) },

    { 0x2995D020, "sceUtilitySavedataErrInitStart", None },
    { 0xB62A4061, "sceUtilitySavedataErrShutdownStart", None },
    { 0xED0FAD38, "sceUtilitySavedataErrUpdate", None },
    { 0x88BC7406, "sceUtilitySavedataErrGetStatus", None },

    { 0xBDA7D894, "sceUtilityHtmlViewerGetStatus", None },
    { 0xCDC3AA41, "sceUtilityHtmlViewerInitStart", None },
    { 0xF5CE1134, "sceUtilityHtmlViewerShutdownStart", None },
    { 0x05AFB9E4, "sceUtilityHtmlViewerUpdate", None },

    { 0x16A1A8D8, "sceUtilityAuthDialogGetStatus", None },
    { 0x943CBA46, "sceUtilityAuthDialogInitStart", None },
    { 0x0F3EEAAC, "sceUtilityAuthDialogShutdownStart", None },
    { 0x147F7C85, "sceUtilityAuthDialogUpdate", None },

    { 0xC629AF26, "sceUtilityLoadAvModule", Some(|c, a| c.load_av_module(arg(a, 0))) },
    { 0xF7D8D092, "sceUtilityUnloadAvModule", Some(|c, a| c.unload_av_module(arg(a, 0))) },

    { 0x2A2B3DE0, "sceUtilityLoadModule", Some(|c, a| c.load_module(arg(a, 0))) },
    { 0xE49BFE92, "sceUtilityUnloadModule", Some(|c, a| c.unload_module(arg(a, 0))) },

    { 0x0251B134, "sceUtilityScreenshotInitStart", Some(|c, a| c.screenshot_init_start(arg(a, 0))) },
    { 0xF9E0008C, "sceUtilityScreenshotShutdownStart", Some(|c, _| c.screenshot_shutdown_start()) },
    { 0xAB083EA9, "sceUtilityScreenshotUpdate", Some(|c, a| HleResult::new(c.screenshot_update(iarg(a, 0)))) },
    { 0xD81957B7, "sceUtilityScreenshotGetStatus", Some(|c, _| HleResult::new(c.screenshot_get_status())) },
    { 0x86A03A27, "sceUtilityScreenshotContStart", Some(|c, a| HleResult::new(c.screenshot_cont_start(arg(a, 0)))) },

    { 0x0D5BC6D2, "sceUtilityLoadUsbModule", Some(|c, a| HleResult::new(c.load_usb_module(arg(a, 0)))) },
    { 0xF64910F0, "sceUtilityUnloadUsbModule", Some(|c, a| HleResult::new(c.unload_usb_module(arg(a, 0)))) },

    { 0x24AC31EB, "sceUtilityGamedataInstallInitStart", Some(|c, a| c.gamedata_install_init_start(arg(a, 0))) },
    { 0x32E32DCB, "sceUtilityGamedataInstallShutdownStart", Some(|c, _| c.gamedata_install_shutdown_start()) },
    { 0x4AECD179, "sceUtilityGamedataInstallUpdate", Some(|c, a| HleResult::new(c.gamedata_install_update(iarg(a, 0)))) },
    { 0xB57E95D9, "sceUtilityGamedataInstallGetStatus", Some(|c, _| HleResult::new(c.gamedata_install_get_status())) },
    { 0x180F7B62, "sceUtilityGamedataInstallAbort", Some(|c, _| HleResult::new(c.gamedata_install_abort())) },

    { 0x16D02AF0, "sceUtilityNpSigninInitStart", Some(|c, a| c.np_signin_init_start(arg(a, 0))) },
    { 0xE19C97D6, "sceUtilityNpSigninShutdownStart", Some(|c, _| c.np_signin_shutdown_start()) },
    { 0xF3FBC572, "sceUtilityNpSigninUpdate", Some(|c, a| HleResult::new(c.np_signin_update(iarg(a, 0)))) },
    { 0x86ABDB1B, "sceUtilityNpSigninGetStatus", Some(|c, _| HleResult::new(c.np_signin_get_status())) },

    { 0x1281DA8E, "sceUtilityInstallInitStart", None },
    { 0x5EF1C24A, "sceUtilityInstallShutdownStart", None },
    { 0xA03D29BA, "sceUtilityInstallUpdate", None },
    { 0xC4700FA3, "sceUtilityInstallGetStatus", None },

    { 0x54A5C62F, "sceUtilityStoreCheckoutShutdownStart", None },
    { 0xDA97F1AA, "sceUtilityStoreCheckoutInitStart", None },
    { 0xB8592D5F, "sceUtilityStoreCheckoutUpdate", None },
    { 0x3AAD51DC, "sceUtilityStoreCheckoutGetStatus", None },

    { 0xD17A0573, "sceUtilityPS3ScanShutdownStart", None },
    { 0x42071A83, "sceUtilityPS3ScanInitStart", None },
    { 0xD852CDCE, "sceUtilityPS3ScanUpdate", None },
    { 0x89317C8F, "sceUtilityPS3ScanGetStatus", None },

    { 0xC130D441, "sceUtilityPsnShutdownStart", None },
    { 0xA7BB7C67, "sceUtilityPsnInitStart", None },
    { 0x0940A1B9, "sceUtilityPsnUpdate", None },
    { 0x094198B8, "sceUtilityPsnGetStatus", None },

    { 0x9F313D14, "sceUtilityAutoConnectShutdownStart", None },
    { 0x3A15CD0A, "sceUtilityAutoConnectInitStart", None },
    { 0xD23665F4, "sceUtilityAutoConnectUpdate", None },
    { 0xD4C2BD73, "sceUtilityAutoConnectGetStatus", None },
    { 0x0E0C27AF, "sceUtilityAutoConnectAbort", None },

    { 0x06A48659, "sceUtilityRssSubscriberShutdownStart", None },
    { 0x4B0A8FE5, "sceUtilityRssSubscriberInitStart", None },
    { 0xA084E056, "sceUtilityRssSubscriberUpdate", None },
    { 0x2B96173B, "sceUtilityRssSubscriberGetStatus", None },

    { 0x149A7895, "sceUtilityDNASShutdownStart", None },
    { 0xDDE5389D, "sceUtilityDNASInitStart", None },
    { 0x4A833BA4, "sceUtilityDNASUpdate", None },
    { 0xA50E5B30, "sceUtilityDNASGetStatus", None },

    { 0xE7B778D8, "sceUtilityRssReaderShutdownStart", None },
    { 0x81C44706, "sceUtilityRssReaderInitStart", None },
    { 0x6F56F9CF, "sceUtilityRssReaderUpdate", None },
    { 0x8326AB05, "sceUtilityRssReaderGetStatus", None },
    { 0xB0FB7FF5, "sceUtilityRssReaderContStart", None },

    { 0xBC6B6296, "sceNetplayDialogShutdownStart", None },
    { 0x3AD50AE7, "sceNetplayDialogInitStart", None },
    { 0x417BED54, "sceNetplayDialogUpdate", None },
    { 0xB6CEE597, "sceNetplayDialogGetStatus", None },
];

pub fn find_export(nid: u32) -> Option<&'static UtilityFunction> {
    UTILITY_EXPORTS.iter().find(|f| f.nid == nid)
}

/// Resolve and invoke an export. Unknown NIDs yield `None`; known but
/// unimplemented exports log and succeed, which is what the firmware's
/// dormant dialogs effectively do.
pub fn dispatch(ctx: &mut UtilityContext, nid: u32, args: &[u32]) -> Option<HleResult> {
    let export = find_export(nid)?;
    match export.handler {
        Some(handler) => Some(handler(ctx, args)),
        None => {
            warn!("{} (nid 0x{:08X}) not implemented", export.name, nid);
            Some(HleResult::new(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_core::config::Config;
    use std::collections::HashSet;

    #[test]
    fn test_nids_unique() {
        let mut seen = HashSet::new();
        for export in UTILITY_EXPORTS {
            assert!(seen.insert(export.nid), "duplicate nid 0x{:08X}", export.nid);
        }
    }

    #[test]
    fn test_dispatch_known_nid() {
        let mut ctx = UtilityContext::new(Config::default());
        // sceUtilityLoadModule(0x3FF)
        let result = dispatch(&mut ctx, 0x2A2B3DE0, &[0x3FF]).unwrap();
        assert_eq!(result.value, 0);
        assert_eq!(result.delay_us, 130);
        assert!(ctx.loaded_modules().is_loaded(0x3FF));
    }

    #[test]
    fn test_dispatch_unknown_nid() {
        let mut ctx = UtilityContext::new(Config::default());
        assert!(dispatch(&mut ctx, 0xDEADBEEF, &[]).is_none());
    }

    #[test]
    fn test_dispatch_unimplemented_export_succeeds() {
        let mut ctx = UtilityContext::new(Config::default());
        // sceUtilityHtmlViewerInitStart has no handler
        let result = dispatch(&mut ctx, 0xCDC3AA41, &[0]).unwrap();
        assert_eq!(result.value, 0);
    }
}
