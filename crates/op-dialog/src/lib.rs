//! Firmware utility dialogs for oxidized-psp
//!
//! Each dialog the firmware can present to the player (save data browser,
//! message box, on-screen keyboard, ...) is a small state machine walking
//! the shared lifecycle None -> Init -> Running -> Finished -> Shutdown.
//! The session manager in `op-hle` drives them through the uniform
//! [`UtilityDialog`] capability interface and owns the "one dialog at a
//! time" rule; nothing here knows about sessions or helper threads.

pub mod base;
pub mod gamedata_install;
pub mod msg;
pub mod netconf;
pub mod np_signin;
pub mod osk;
pub mod savedata;
pub mod screenshot;

pub use base::{CommonParams, DialogBase, DialogEnv, COMMON_PARAMS_SIZE};
pub use gamedata_install::GamedataInstallDialog;
pub use msg::MsgDialog;
pub use netconf::NetconfDialog;
pub use np_signin::NpSigninDialog;
pub use osk::OskDialog;
pub use savedata::SaveDataDialog;
pub use screenshot::ScreenshotDialog;

use serde::{Deserialize, Serialize};

/// Dialog lifecycle status as reported to the guest
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DialogStatus {
    #[default]
    None = 0,
    Init = 1,
    Running = 2,
    Finished = 3,
    Shutdown = 4,
}

/// Which dialog a session refers to
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DialogType {
    #[default]
    None = 0,
    SaveData = 1,
    Msg = 2,
    Osk = 3,
    Net = 4,
    Screenshot = 5,
    GameSharing = 6,
    GamedataInstall = 7,
    NpSignin = 8,
}

/// The dialog was asked for an operation its current status does not allow
pub const SCE_ERROR_UTILITY_INVALID_STATUS: u32 = 0x8011_0001;

/// Result written back to the guest param block on normal completion
pub const DIALOG_RESULT_OK: u32 = 0;
/// Result written back when the player (or an abort call) cancels
pub const DIALOG_RESULT_CANCEL: u32 = 1;

/// Uniform capability interface every dialog variant implements
pub trait UtilityDialog {
    fn dialog_type(&self) -> DialogType;
    fn base(&self) -> &DialogBase;
    fn base_mut(&mut self) -> &mut DialogBase;

    /// Begin presenting the dialog. Negative results mean the param block
    /// was unusable and the session must not become active.
    fn init(&mut self, env: &mut DialogEnv, param_addr: u32) -> i32;

    /// Advance one frame of simulated interaction
    fn update(&mut self, env: &mut DialogEnv, anim_speed: i32) -> i32;

    fn get_status(&mut self, env: &mut DialogEnv) -> i32 {
        self.base_mut().status_code(env.now_us)
    }

    fn shutdown(&mut self, env: &mut DialogEnv) -> i32 {
        let _ = env;
        self.base_mut().change_status_now(DialogStatus::Shutdown);
        0
    }

    fn abort(&mut self, env: &mut DialogEnv) -> i32 {
        let _ = env;
        SCE_ERROR_UTILITY_INVALID_STATUS as i32
    }

    fn cont_start(&mut self, env: &mut DialogEnv, param_addr: u32) -> i32 {
        let _ = (env, param_addr);
        SCE_ERROR_UTILITY_INVALID_STATUS as i32
    }

    /// Completion of the simulated firmware init handshake
    fn finish_init(&mut self) -> i32 {
        let base = self.base_mut();
        if base.status == DialogStatus::Init {
            base.change_status_now(DialogStatus::Running);
        }
        0
    }

    /// Completion of the simulated firmware shutdown handshake
    fn finish_shutdown(&mut self) -> i32 {
        self.base_mut().change_status_now(DialogStatus::None);
        0
    }

    /// The volatile memory region was handed back to the guest
    fn finish_volatile(&mut self) {}

    /// Drop all state, as on emulator shutdown
    fn reset(&mut self);
}

/// The fixed set of dialog instances, one per supported type.
///
/// A closed set rather than a registry: the firmware has exactly these
/// dialogs, and save states address them by field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogSet {
    pub savedata: SaveDataDialog,
    pub msg: MsgDialog,
    pub osk: OskDialog,
    pub netconf: NetconfDialog,
    pub screenshot: ScreenshotDialog,
    pub gamedata_install: GamedataInstallDialog,
    pub np_signin: NpSigninDialog,
}

impl DialogSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the dialog for a type. GameSharing has handlers but no
    /// dialog body, so it (and None) yield nothing.
    pub fn get_mut(&mut self, ty: DialogType) -> Option<&mut dyn UtilityDialog> {
        match ty {
            DialogType::None | DialogType::GameSharing => None,
            DialogType::SaveData => Some(&mut self.savedata),
            DialogType::Msg => Some(&mut self.msg),
            DialogType::Osk => Some(&mut self.osk),
            DialogType::Net => Some(&mut self.netconf),
            DialogType::Screenshot => Some(&mut self.screenshot),
            DialogType::GamedataInstall => Some(&mut self.gamedata_install),
            DialogType::NpSignin => Some(&mut self.np_signin),
        }
    }

    pub fn reset_all(&mut self) {
        self.savedata.reset();
        self.msg.reset();
        self.osk.reset();
        self.netconf.reset();
        self.screenshot.reset();
        self.gamedata_install.reset();
        self.np_signin.reset();
    }
}
