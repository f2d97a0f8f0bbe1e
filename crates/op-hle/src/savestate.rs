//! Utility subsystem snapshots
//!
//! The snapshot format has grown over six revisions; old saves out in
//! the wild must keep loading, so every field added after the first
//! revision is optional and defaulted on the way in. Writers always emit
//! the current revision.

use std::collections::BTreeMap;

use op_core::error::EmulatorError;
use op_dialog::{
    DialogType, GamedataInstallDialog, MsgDialog, NetconfDialog, NpSigninDialog, OskDialog,
    SaveDataDialog, ScreenshotDialog,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::helper::AccessTask;
use crate::utility::UtilityContext;

/// Current snapshot revision
pub const SAVESTATE_VERSION: i32 = 6;
/// Oldest revision we still read
pub const SAVESTATE_MIN_VERSION: i32 = 1;

/// Delay before a restored helper task ticks again
const RESTORED_TASK_RESUME_US: u64 = 1000;

#[derive(Debug, Serialize, Deserialize)]
pub struct UtilitySnapshot {
    pub version: i32,
    pub current_type: DialogType,
    pub current_active: bool,
    pub savedata: SaveDataDialog,
    pub msg: MsgDialog,
    pub osk: OskDialog,
    pub netconf: NetconfDialog,
    pub screenshot: ScreenshotDialog,
    pub gamedata_install: GamedataInstallDialog,
    /// v2+: module id -> load address
    #[serde(default)]
    pub loaded_modules: Option<BTreeMap<u32, u32>>,
    /// v1 stored only the ids
    #[serde(default)]
    pub loaded_module_ids: Option<Vec<u32>>,
    /// v3+
    #[serde(default)]
    pub volatile_unlock_event: Option<usize>,
    /// v4+
    #[serde(default)]
    pub access_task: Option<AccessTask>,
    /// v5+
    #[serde(default)]
    pub access_task_finished: Option<bool>,
    /// v6+
    #[serde(default)]
    pub np_signin: Option<NpSigninDialog>,
}

/// Capture the utility state at the current revision
pub fn capture(ctx: &UtilityContext) -> UtilitySnapshot {
    UtilitySnapshot {
        version: SAVESTATE_VERSION,
        current_type: ctx.current_type,
        current_active: ctx.current_active,
        savedata: ctx.dialogs.savedata.clone(),
        msg: ctx.dialogs.msg.clone(),
        osk: ctx.dialogs.osk.clone(),
        netconf: ctx.dialogs.netconf.clone(),
        screenshot: ctx.dialogs.screenshot.clone(),
        gamedata_install: ctx.dialogs.gamedata_install.clone(),
        loaded_modules: Some(ctx.modules.snapshot()),
        loaded_module_ids: None,
        volatile_unlock_event: Some(ctx.volatile_unlock_event),
        access_task: ctx.access_task.clone(),
        access_task_finished: Some(ctx.access_task_finished),
        np_signin: Some(ctx.dialogs.np_signin.clone()),
    }
}

/// Replace the utility state with a snapshot's
pub fn apply(ctx: &mut UtilityContext, snapshot: UtilitySnapshot) -> Result<(), EmulatorError> {
    if !(SAVESTATE_MIN_VERSION..=SAVESTATE_VERSION).contains(&snapshot.version) {
        return Err(EmulatorError::SaveState(format!(
            "unsupported utility snapshot version {}",
            snapshot.version
        )));
    }

    ctx.current_type = snapshot.current_type;
    ctx.current_active = snapshot.current_active;
    ctx.dialogs.savedata = snapshot.savedata;
    ctx.dialogs.msg = snapshot.msg;
    ctx.dialogs.osk = snapshot.osk;
    ctx.dialogs.netconf = snapshot.netconf;
    ctx.dialogs.screenshot = snapshot.screenshot;
    ctx.dialogs.gamedata_install = snapshot.gamedata_install;

    let modules = match (snapshot.loaded_modules, snapshot.loaded_module_ids) {
        (Some(map), _) => map,
        (None, Some(ids)) => {
            // v1 never recorded addresses
            ids.into_iter().map(|id| (id, 0)).collect()
        }
        (None, None) => BTreeMap::new(),
    };
    ctx.modules.replace(modules);

    // The event handle may have moved between sessions; re-register
    ctx.volatile_unlock_event = ctx
        .timing
        .restore_register_event(snapshot.volatile_unlock_event, "UtilityVolatileUnlock");

    ctx.timing.unschedule_all(ctx.access_task_event);
    match snapshot.access_task {
        Some(task) => {
            info!("resuming utility access task from snapshot");
            ctx.access_task = Some(task);
            ctx.access_task_state = "from save state";
            ctx.timing
                .schedule_event(RESTORED_TASK_RESUME_US, ctx.access_task_event, 0);
        }
        None => {
            if ctx.access_task.take().is_some() {
                warn!("live utility access task discarded by snapshot restore");
            }
            ctx.access_task_state = "cleared from save state";
        }
    }
    ctx.access_task_finished = snapshot.access_task_finished.unwrap_or(true);

    match snapshot.np_signin {
        Some(np_signin) => {
            ctx.dialogs.np_signin = np_signin;
            ctx.last_savestate_version = -1;
        }
        None => {
            // Pre-v6 snapshot; remember it for compat heuristics
            ctx.dialogs.np_signin = NpSigninDialog::default();
            ctx.last_savestate_version = snapshot.version;
        }
    }
    Ok(())
}

pub fn save_json(ctx: &UtilityContext) -> Result<String, EmulatorError> {
    serde_json::to_string(&capture(ctx)).map_err(|e| EmulatorError::SaveState(e.to_string()))
}

pub fn load_json(ctx: &mut UtilityContext, data: &str) -> Result<(), EmulatorError> {
    let snapshot: UtilitySnapshot =
        serde_json::from_str(data).map_err(|e| EmulatorError::SaveState(e.to_string()))?;
    apply(ctx, snapshot)
}
