//! sceUtility session management
//!
//! [`UtilityContext`] owns everything behind the sceUtility syscall
//! surface: the dialog set and the one-active-dialog rule, the module
//! registry, the simulated helper thread, and the system collaborators
//! (guest memory, allocator, virtual clock, kernel state). Syscalls are
//! plain methods returning [`HleResult`] so a dispatcher can apply the
//! firmware's observable delays.

use op_core::config::Config;
use op_core::timing::{CoreTiming, EventType, FiredEvent};
use op_dialog::{DialogEnv, DialogSet, DialogType};
use op_memory::{GuestMemory, UserMemoryAllocator};
use tracing::{debug, error, info, trace, warn};

use crate::errors::{SCE_ERROR_AV_MODULE_BAD_ID, SCE_ERROR_UTILITY_WRONG_TYPE};
use crate::helper::{AccessTask, AccessTaskKind, TaskStep};
use crate::kernel::KernelState;
use crate::media::MediaEngineState;
use crate::module::LoadedModules;
use crate::netparam::NetParamState;
use crate::{sysparam, HleResult};

/// Helper thread priority when the param block doesn't name one
const DEFAULT_ACCESS_PRIORITY: i32 = 0x22;

/// Volatile memory is handed back this long after a shutdown begins
const VOLATILE_UNLOCK_DELAY_US: u64 = 250;

/// Charged by sceUtilityOskUpdate: one vblank period plus a little slack
const OSK_UPDATE_CYCLES: u64 = 184_593;

/// Firmware handshake length for presenting each dialog
fn init_handshake_delay_us(ty: DialogType) -> u64 {
    match ty {
        DialogType::SaveData => 30_000,
        DialogType::Msg => 35_000,
        DialogType::Osk => 50_000,
        DialogType::Screenshot => 25_000,
        _ => 20_000,
    }
}

/// Handshake length for dismissing each dialog
fn shutdown_handshake_delay_us(ty: DialogType) -> u64 {
    match ty {
        DialogType::Osk => 40_000,
        _ => 30_000,
    }
}

pub struct UtilityContext {
    pub mem: GuestMemory,
    pub user_alloc: UserMemoryAllocator,
    pub timing: CoreTiming,
    pub kernel: KernelState,
    pub config: Config,
    pub(crate) dialogs: DialogSet,
    pub(crate) current_type: DialogType,
    pub(crate) current_active: bool,
    pub(crate) old_status: i32,
    pub(crate) modules: LoadedModules,
    pub(crate) media: MediaEngineState,
    pub(crate) net: NetParamState,
    pub(crate) access_task: Option<AccessTask>,
    pub(crate) access_task_finished: bool,
    pub(crate) access_task_state: &'static str,
    pub(crate) volatile_unlock_event: EventType,
    pub(crate) access_task_event: EventType,
    pub(crate) last_savestate_version: i32,
}

impl UtilityContext {
    pub fn new(config: Config) -> Self {
        let mut timing = CoreTiming::new();
        let volatile_unlock_event = timing.register_event("UtilityVolatileUnlock");
        let access_task_event = timing.register_event("UtilityAccessTask");
        let media = MediaEngineState {
            audio_hle_disabled: config.compat.disable_audio_hle,
            ..MediaEngineState::default()
        };
        Self {
            mem: GuestMemory::new(),
            user_alloc: UserMemoryAllocator::new(),
            timing,
            kernel: KernelState::new(),
            config,
            dialogs: DialogSet::new(),
            current_type: DialogType::None,
            current_active: false,
            old_status: -1,
            modules: LoadedModules::new(),
            media,
            net: NetParamState::new(),
            access_task: None,
            access_task_finished: true,
            access_task_state: "initial",
            volatile_unlock_event,
            access_task_event,
            last_savestate_version: -1,
        }
    }

    pub fn current_dialog_type(&self) -> DialogType {
        self.current_type
    }

    pub fn dialog_active(&self) -> bool {
        self.current_active
    }

    pub fn access_task_state(&self) -> &'static str {
        self.access_task_state
    }

    pub fn loaded_modules(&self) -> &LoadedModules {
        &self.modules
    }

    pub fn media(&self) -> &MediaEngineState {
        &self.media
    }

    /// Reset to boot state, as on game launch
    pub fn reset(&mut self) {
        self.dialogs.reset_all();
        self.current_type = DialogType::None;
        self.current_active = false;
        self.old_status = -1;
        self.modules.clear();
        self.media.reset();
        self.net = NetParamState::new();
        self.drop_access_task("initial");
        self.access_task_finished = true;
        self.last_savestate_version = -1;
    }

    /// Emulator teardown; dialogs are force-shut and the task forgotten
    pub fn shutdown(&mut self) {
        self.dialogs.reset_all();
        self.drop_access_task("shutdown");
        self.access_task_finished = true;
        self.last_savestate_version = -1;
    }

    // ------------------------------------------------------------------
    // Time and the helper task

    /// Run `us` of virtual time, delivering due handshake completions
    /// and volatile-memory handbacks in deadline order.
    pub fn advance_time(&mut self, us: u64) {
        let target = self.timing.now_us().saturating_add(us);
        loop {
            let now = self.timing.now_us();
            match self.timing.next_deadline_us() {
                Some(deadline) if deadline <= target => {
                    let fired = self.timing.advance(deadline.saturating_sub(now));
                    for event in fired {
                        self.dispatch_event(event);
                    }
                }
                _ => {
                    self.timing.advance(target.saturating_sub(now));
                    return;
                }
            }
        }
    }

    fn dispatch_event(&mut self, event: FiredEvent) {
        if event.event_type == self.volatile_unlock_event {
            self.handle_volatile_unlock();
        } else if event.event_type == self.access_task_event {
            self.tick_access_task();
        } else {
            trace!("unhandled utility event {}", event.event_type);
        }
    }

    fn handle_volatile_unlock(&mut self) {
        self.kernel.unlock_volatile();
        if let Some(dialog) = self.dialogs.get_mut(self.current_type) {
            dialog.finish_volatile();
        }
    }

    fn tick_access_task(&mut self) {
        let Some(task) = self.access_task.as_mut() else {
            return;
        };
        match task.advance() {
            TaskStep::Sleep(us) => {
                self.timing.schedule_event(us, self.access_task_event, 0);
            }
            TaskStep::Finished => {
                let kind = task.kind;
                let ty = task.dialog_type;
                self.finish_access_task(kind, ty);
            }
        }
    }

    fn finish_access_task(&mut self, kind: AccessTaskKind, ty: DialogType) {
        self.access_task_finished = true;
        self.access_task_state = match kind {
            AccessTaskKind::Init => "init finished",
            AccessTaskKind::Shutdown => "shutdown finished",
        };
        match self.dialogs.get_mut(ty) {
            Some(dialog) => {
                let ret = match kind {
                    AccessTaskKind::Init => dialog.finish_init(),
                    AccessTaskKind::Shutdown => dialog.finish_shutdown(),
                };
                debug!("access task {:?} for {:?} delivered ({})", kind, ty, ret);
            }
            None => error!("access task completion for missing dialog {:?}", ty),
        }
    }

    fn arm_access_task(&mut self, mut task: AccessTask, state: &'static str) {
        match task.advance() {
            TaskStep::Sleep(us) => {
                self.timing.schedule_event(us, self.access_task_event, 0);
                self.access_task_finished = false;
                self.access_task_state = state;
                self.access_task = Some(task);
            }
            TaskStep::Finished => {
                // Degenerate zero-length handshake
                let kind = task.kind;
                let ty = task.dialog_type;
                self.access_task = Some(task);
                self.finish_access_task(kind, ty);
            }
        }
    }

    fn begin_init_handshake(&mut self, ty: DialogType, delay_us: u64, priority: i32) {
        self.cleanup_dialog_tasks(true);
        // The worker locks volatile memory as its first act
        self.kernel.lock_volatile();
        let task = AccessTask::new(AccessTaskKind::Init, ty, delay_us, priority);
        self.arm_access_task(task, "initializing");
    }

    fn begin_shutdown_handshake(&mut self, ty: DialogType, delay_us: u64, priority: i32) {
        self.cleanup_dialog_tasks(true);
        // The firmware spawns this worker with interrupts masked
        let prev_interrupts = self.kernel.suspend_interrupts();
        let task = AccessTask::new(AccessTaskKind::Shutdown, ty, delay_us, priority);
        self.arm_access_task(task, "shutting down");
        self.kernel.restore_interrupts(prev_interrupts);
        self.timing
            .schedule_event(VOLATILE_UNLOCK_DELAY_US, self.volatile_unlock_event, 0);
    }

    /// Reap a finished helper task; with `force`, terminate a live one
    /// and release the volatile lock in case a shutdown held it.
    fn cleanup_dialog_tasks(&mut self, force: bool) {
        if self.access_task.is_none() {
            return;
        }
        let done = self.access_task.as_ref().is_some_and(|t| t.is_done());
        if done || self.access_task_finished {
            self.access_task = None;
            self.access_task_state = "cleaned up";
        } else if force {
            error!(
                "utility access task still running, state: {}, dialog={:?}/{}",
                self.access_task_state, self.current_type, self.current_active
            );
            self.drop_access_task("force terminated");
            self.kernel.unlock_volatile();
        }
    }

    fn drop_access_task(&mut self, state: &'static str) {
        if self.access_task.take().is_some() {
            self.timing.unschedule_all(self.access_task_event);
            self.access_task_state = state;
        }
    }

    // ------------------------------------------------------------------
    // Session bookkeeping

    fn activate_dialog(&mut self, ty: DialogType) {
        self.cleanup_dialog_tasks(false);
        if !self.current_active {
            self.current_type = ty;
            self.current_active = true;
            // So the next status poll gets logged
            self.old_status = -1;
        }
    }

    fn deactivate_dialog(&mut self) {
        self.cleanup_dialog_tasks(false);
        self.current_active = false;
    }

    fn access_priority(&mut self, ty: DialogType) -> i32 {
        self.dialogs
            .get_mut(ty)
            .and_then(|d| d.base().common)
            .map(|c| c.access_thread as i32)
            .filter(|&p| p != 0)
            .unwrap_or(DEFAULT_ACCESS_PRIORITY)
    }

    // ------------------------------------------------------------------
    // Generic dialog operations

    fn dialog_init_start(&mut self, ty: DialogType, param_addr: u32) -> HleResult {
        if self.current_active && self.current_type != ty {
            if ty == DialogType::SaveData && self.config.compat.savedata_overlap_workaround {
                // Some games start a save while another dialog is still
                // tearing down. Terminate the straggler and proceed.
                warn!(
                    "savedata overlap workaround engaged (last snapshot version {})",
                    self.last_savestate_version
                );
                if self.access_task.is_some() {
                    self.drop_access_task("terminated");
                    self.access_task_finished = true;
                    self.kernel.unlock_volatile();
                }
            } else {
                warn!("{:?} init while {:?} active", ty, self.current_type);
                return HleResult::code(SCE_ERROR_UTILITY_WRONG_TYPE);
            }
        }

        self.activate_dialog(ty);
        let now_us = self.timing.now_us();
        let ret = {
            let mut env = DialogEnv { mem: &mut self.mem, now_us };
            match self.dialogs.get_mut(ty) {
                Some(dialog) => dialog.init(&mut env, param_addr),
                None => return HleResult::code(SCE_ERROR_UTILITY_WRONG_TYPE),
            }
        };
        if ret < 0 {
            // A rejected param block must not leave the session claimed
            if ty == DialogType::GamedataInstall {
                self.deactivate_dialog();
            }
            return HleResult::new(ret);
        }
        let priority = self.access_priority(ty);
        self.begin_init_handshake(ty, init_handshake_delay_us(ty), priority);
        HleResult::new(ret)
    }

    fn dialog_shutdown_start(&mut self, ty: DialogType, require_active: bool) -> HleResult {
        if self.current_type != ty || (require_active && !self.current_active) {
            warn!("{:?} shutdown while {:?} active", ty, self.current_type);
            return HleResult::code(SCE_ERROR_UTILITY_WRONG_TYPE);
        }
        self.deactivate_dialog();
        let now_us = self.timing.now_us();
        let ret = {
            let mut env = DialogEnv { mem: &mut self.mem, now_us };
            match self.dialogs.get_mut(ty) {
                Some(dialog) => dialog.shutdown(&mut env),
                None => return HleResult::code(SCE_ERROR_UTILITY_WRONG_TYPE),
            }
        };
        let priority = self.access_priority(ty);
        self.begin_shutdown_handshake(ty, shutdown_handshake_delay_us(ty), priority);
        HleResult::new(ret)
    }

    fn dialog_update(&mut self, ty: DialogType, anim_speed: i32, require_active: bool) -> i32 {
        if self.current_type != ty || (require_active && !self.current_active) {
            warn!("{:?} update while {:?} active", ty, self.current_type);
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        let now_us = self.timing.now_us();
        let mut env = DialogEnv { mem: &mut self.mem, now_us };
        match self.dialogs.get_mut(ty) {
            Some(dialog) => dialog.update(&mut env, anim_speed),
            None => SCE_ERROR_UTILITY_WRONG_TYPE as i32,
        }
    }

    fn dialog_get_status(&mut self, ty: DialogType) -> i32 {
        let now_us = self.timing.now_us();
        let status = {
            let mut env = DialogEnv { mem: &mut self.mem, now_us };
            match self.dialogs.get_mut(ty) {
                Some(dialog) => dialog.get_status(&mut env),
                None => return SCE_ERROR_UTILITY_WRONG_TYPE as i32,
            }
        };
        self.cleanup_dialog_tasks(false);
        // Games poll every frame; only log transitions
        if self.old_status != status {
            self.old_status = status;
            debug!("{:?} status -> {}", ty, status);
        } else {
            trace!("{:?} status {}", ty, status);
        }
        status
    }

    fn dialog_abort(&mut self, ty: DialogType) -> i32 {
        if self.current_type != ty {
            warn!("{:?} abort while {:?} active", ty, self.current_type);
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        let now_us = self.timing.now_us();
        let mut env = DialogEnv { mem: &mut self.mem, now_us };
        match self.dialogs.get_mut(ty) {
            Some(dialog) => dialog.abort(&mut env),
            None => SCE_ERROR_UTILITY_WRONG_TYPE as i32,
        }
    }

    // ------------------------------------------------------------------
    // Save data dialog

    pub fn savedata_init_start(&mut self, param_addr: u32) -> HleResult {
        self.dialog_init_start(DialogType::SaveData, param_addr)
    }

    pub fn savedata_shutdown_start(&mut self) -> HleResult {
        let ret = self.dialog_shutdown_start(DialogType::SaveData, false);
        self.timing.eat_cycles(30_000);
        ret
    }

    pub fn savedata_update(&mut self, anim_speed: i32) -> HleResult {
        let ret = self.dialog_update(DialogType::SaveData, anim_speed, false);
        if ret >= 0 {
            HleResult::delayed(ret, 300)
        } else {
            HleResult::new(ret)
        }
    }

    pub fn savedata_get_status(&mut self) -> i32 {
        self.timing.eat_cycles(200);
        if self.current_type != DialogType::SaveData {
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        self.dialog_get_status(DialogType::SaveData)
    }

    // ------------------------------------------------------------------
    // Message dialog

    pub fn msg_dialog_init_start(&mut self, param_addr: u32) -> HleResult {
        self.dialog_init_start(DialogType::Msg, param_addr)
    }

    pub fn msg_dialog_shutdown_start(&mut self) -> HleResult {
        self.dialog_shutdown_start(DialogType::Msg, false)
    }

    pub fn msg_dialog_update(&mut self, anim_speed: i32) -> HleResult {
        let ret = self.dialog_update(DialogType::Msg, anim_speed, false);
        if ret >= 0 {
            HleResult::delayed(ret, 800)
        } else {
            HleResult::new(ret)
        }
    }

    pub fn msg_dialog_get_status(&mut self) -> i32 {
        if self.current_type != DialogType::Msg {
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        self.dialog_get_status(DialogType::Msg)
    }

    pub fn msg_dialog_abort(&mut self) -> i32 {
        self.dialog_abort(DialogType::Msg)
    }

    // ------------------------------------------------------------------
    // On-screen keyboard

    pub fn osk_init_start(&mut self, param_addr: u32) -> HleResult {
        self.dialog_init_start(DialogType::Osk, param_addr)
    }

    pub fn osk_shutdown_start(&mut self) -> HleResult {
        self.dialog_shutdown_start(DialogType::Osk, false)
    }

    pub fn osk_update(&mut self, anim_speed: i32) -> i32 {
        if self.current_type != DialogType::Osk {
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        // Ghost Recon: Predator needs update to cost about a vblank
        self.timing.eat_cycles(OSK_UPDATE_CYCLES);
        self.dialog_update(DialogType::Osk, anim_speed, false)
    }

    pub fn osk_get_status(&mut self) -> i32 {
        if self.current_type != DialogType::Osk {
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        self.dialog_get_status(DialogType::Osk)
    }

    // ------------------------------------------------------------------
    // Network configuration dialog

    pub fn netconf_init_start(&mut self, param_addr: u32) -> HleResult {
        self.dialog_init_start(DialogType::Net, param_addr)
    }

    pub fn netconf_shutdown_start(&mut self) -> HleResult {
        self.dialog_shutdown_start(DialogType::Net, false)
    }

    pub fn netconf_update(&mut self, anim_speed: i32) -> i32 {
        self.dialog_update(DialogType::Net, anim_speed, false)
    }

    pub fn netconf_get_status(&mut self) -> i32 {
        if self.current_type != DialogType::Net {
            // Danball Senki BOOST polls this while nothing is up
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        self.dialog_get_status(DialogType::Net)
    }

    // ------------------------------------------------------------------
    // Screenshot dialog

    pub fn screenshot_init_start(&mut self, param_addr: u32) -> HleResult {
        self.dialog_init_start(DialogType::Screenshot, param_addr)
    }

    pub fn screenshot_shutdown_start(&mut self) -> HleResult {
        self.dialog_shutdown_start(DialogType::Screenshot, false)
    }

    pub fn screenshot_update(&mut self, anim_speed: i32) -> i32 {
        self.dialog_update(DialogType::Screenshot, anim_speed, false)
    }

    pub fn screenshot_get_status(&mut self) -> i32 {
        if self.current_type != DialogType::Screenshot {
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        self.dialog_get_status(DialogType::Screenshot)
    }

    pub fn screenshot_cont_start(&mut self, param_addr: u32) -> i32 {
        if self.current_type != DialogType::Screenshot {
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        let now_us = self.timing.now_us();
        let mut env = DialogEnv { mem: &mut self.mem, now_us };
        match self.dialogs.get_mut(DialogType::Screenshot) {
            Some(dialog) => dialog.cont_start(&mut env, param_addr),
            None => SCE_ERROR_UTILITY_WRONG_TYPE as i32,
        }
    }

    // ------------------------------------------------------------------
    // Game data install dialog

    pub fn gamedata_install_init_start(&mut self, param_addr: u32) -> HleResult {
        self.dialog_init_start(DialogType::GamedataInstall, param_addr)
    }

    pub fn gamedata_install_shutdown_start(&mut self) -> HleResult {
        self.dialog_shutdown_start(DialogType::GamedataInstall, true)
    }

    pub fn gamedata_install_update(&mut self, anim_speed: i32) -> i32 {
        self.dialog_update(DialogType::GamedataInstall, anim_speed, true)
    }

    pub fn gamedata_install_get_status(&mut self) -> i32 {
        self.timing.eat_cycles(200);
        if self.current_type != DialogType::GamedataInstall {
            // Polled incorrectly all the time; not worth a warning
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        let now_us = self.timing.now_us();
        let status = {
            let mut env = DialogEnv { mem: &mut self.mem, now_us };
            match self.dialogs.get_mut(DialogType::GamedataInstall) {
                Some(dialog) => dialog.get_status(&mut env),
                None => return SCE_ERROR_UTILITY_WRONG_TYPE as i32,
            }
        };
        self.cleanup_dialog_tasks(false);
        status
    }

    pub fn gamedata_install_abort(&mut self) -> i32 {
        if !self.current_active || self.current_type != DialogType::GamedataInstall {
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        self.deactivate_dialog();
        self.dialog_abort(DialogType::GamedataInstall)
    }

    // ------------------------------------------------------------------
    // NP sign-in dialog

    pub fn np_signin_init_start(&mut self, param_addr: u32) -> HleResult {
        self.dialog_init_start(DialogType::NpSignin, param_addr)
    }

    pub fn np_signin_shutdown_start(&mut self) -> HleResult {
        self.dialog_shutdown_start(DialogType::NpSignin, false)
    }

    pub fn np_signin_update(&mut self, anim_speed: i32) -> i32 {
        self.dialog_update(DialogType::NpSignin, anim_speed, false)
    }

    pub fn np_signin_get_status(&mut self) -> i32 {
        if self.current_type != DialogType::NpSignin {
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        self.dialog_get_status(DialogType::NpSignin)
    }

    // ------------------------------------------------------------------
    // Game sharing: real hardware only; the session rules still apply

    pub fn game_sharing_init_start(&mut self, param_addr: u32) -> i32 {
        if self.current_active && self.current_type != DialogType::GameSharing {
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        self.activate_dialog(DialogType::GameSharing);
        error!("game sharing dialog not implemented (params at 0x{:08x})", param_addr);
        0
    }

    pub fn game_sharing_shutdown_start(&mut self) -> i32 {
        if self.current_type != DialogType::GameSharing {
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        self.deactivate_dialog();
        0
    }

    pub fn game_sharing_update(&mut self, _anim_speed: i32) -> i32 {
        if self.current_type != DialogType::GameSharing {
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        0
    }

    pub fn game_sharing_get_status(&mut self) -> i32 {
        if self.current_type != DialogType::GameSharing {
            return SCE_ERROR_UTILITY_WRONG_TYPE as i32;
        }
        self.cleanup_dialog_tasks(false);
        0
    }

    // ------------------------------------------------------------------
    // Module loading

    pub fn load_module(&mut self, module: u32) -> HleResult {
        let ret = self.modules.load(module, &mut self.user_alloc, &mut self.media);
        // The me_core stub answers almost immediately; everything else
        // models a real prx load from flash
        let delay = if module == 0x3FF { 130 } else { 25_000 };
        HleResult::delayed(ret, delay)
    }

    pub fn unload_module(&mut self, module: u32) -> HleResult {
        let ret = self.modules.unload(module, &mut self.user_alloc, &mut self.media);
        let delay = if module == 0x3FF { 110 } else { 400 };
        HleResult::delayed(ret, delay)
    }

    /// sceUtilityLoadAvModule: the AV id space is 0x300 | id
    pub fn load_av_module(&mut self, module: u32) -> HleResult {
        if module > 7 {
            error!("load av module {}: invalid id", module);
            return HleResult::code(SCE_ERROR_AV_MODULE_BAD_ID);
        }
        let ret = self
            .modules
            .load(0x300 | module, &mut self.user_alloc, &mut self.media);
        HleResult::delayed(ret, 25_000)
    }

    pub fn unload_av_module(&mut self, module: u32) -> HleResult {
        if module > 7 {
            error!("unload av module {}: invalid id", module);
            return HleResult::code(SCE_ERROR_AV_MODULE_BAD_ID);
        }
        let ret = self
            .modules
            .unload(0x300 | module, &mut self.user_alloc, &mut self.media);
        HleResult::delayed(ret, 800)
    }

    /// Net modules are resident in our firmware image; accept and move on
    pub fn load_net_module(&mut self, module: u32) -> i32 {
        info!("load net module {} (no-op)", module);
        0
    }

    pub fn unload_net_module(&mut self, module: u32) -> i32 {
        info!("unload net module {} (no-op)", module);
        0
    }

    pub fn load_usb_module(&mut self, module: u32) -> i32 {
        if !(1..=5).contains(&module) {
            error!("load usb module {}: invalid id", module);
        }
        warn!("usb module {} load not implemented", module);
        0
    }

    pub fn unload_usb_module(&mut self, module: u32) -> i32 {
        if !(1..=5).contains(&module) {
            error!("unload usb module {}: invalid id", module);
        }
        warn!("usb module {} unload not implemented", module);
        0
    }

    // ------------------------------------------------------------------
    // Net configuration parameters

    pub fn check_net_param(&self, id: i32) -> i32 {
        self.net.check(id)
    }

    pub fn get_net_param(&mut self, id: i32, param: u32, data_addr: u32) -> i32 {
        self.net.get(&mut self.mem, id, param, data_addr)
    }

    pub fn get_net_param_latest_id(&mut self, id_addr: u32) -> i32 {
        self.net.latest_id_into(&mut self.mem, id_addr)
    }

    // ------------------------------------------------------------------
    // System parameters

    pub fn get_system_param_int(&mut self, id: u32, dest_addr: u32) -> i32 {
        sysparam::get_int(&self.config, &mut self.mem, id, dest_addr)
    }

    pub fn set_system_param_int(&mut self, id: u32, value: u32) -> i32 {
        sysparam::set_int(id, value)
    }

    pub fn get_system_param_string(&mut self, id: u32, dest_addr: u32, dest_size: u32) -> i32 {
        sysparam::get_string(&self.config, &mut self.mem, id, dest_addr, dest_size)
    }

    pub fn set_system_param_string(&mut self, id: u32, str_addr: u32) -> i32 {
        sysparam::set_string(id, str_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_dialog::DialogStatus;
    use op_memory::USER_MEM_BASE;

    fn ctx() -> UtilityContext {
        UtilityContext::new(Config::default())
    }

    fn write_common_block(ctx: &mut UtilityContext, addr: u32) {
        ctx.mem.write_u32(addr, 52).unwrap();
        ctx.mem.write_u32(addr + 16, 0x22).unwrap();
    }

    #[test]
    fn test_msg_dialog_full_lifecycle() {
        let mut ctx = ctx();
        let addr = USER_MEM_BASE;
        write_common_block(&mut ctx, addr);
        // Message kind: plain text, empty message
        ctx.mem.write_u32(addr + 52, 1).unwrap();

        assert_eq!(ctx.msg_dialog_init_start(addr).value, 0);
        assert!(ctx.dialog_active());
        assert!(ctx.kernel.volatile_locked());
        assert_eq!(ctx.msg_dialog_get_status(), DialogStatus::Init as i32);

        // Let the init handshake finish
        ctx.advance_time(40_000);
        assert_eq!(ctx.msg_dialog_get_status(), DialogStatus::Running as i32);

        ctx.msg_dialog_update(1);
        ctx.msg_dialog_update(1);
        ctx.advance_time(1_000);
        assert_eq!(ctx.msg_dialog_get_status(), DialogStatus::Finished as i32);

        assert_eq!(ctx.msg_dialog_shutdown_start().value, 0);
        assert!(!ctx.dialog_active());
        ctx.advance_time(40_000);
        assert_eq!(ctx.msg_dialog_get_status(), DialogStatus::None as i32);
        // Volatile memory went back to the game during shutdown
        assert!(!ctx.kernel.volatile_locked());
    }

    #[test]
    fn test_single_active_dialog_rule() {
        let mut ctx = ctx();
        let addr = USER_MEM_BASE;
        write_common_block(&mut ctx, addr);

        assert_eq!(ctx.msg_dialog_init_start(addr).value, 0);
        let res = ctx.savedata_init_start(addr);
        assert_eq!(res.value, SCE_ERROR_UTILITY_WRONG_TYPE as i32);
        // The message dialog session is untouched
        assert_eq!(ctx.current_dialog_type(), DialogType::Msg);
    }

    #[test]
    fn test_savedata_overlap_workaround() {
        let mut ctx = ctx();
        ctx.config.compat.savedata_overlap_workaround = true;
        let addr = USER_MEM_BASE;
        write_common_block(&mut ctx, addr);

        assert_eq!(ctx.msg_dialog_init_start(addr).value, 0);
        // With the workaround the overlapping save takes over
        let res = ctx.savedata_init_start(addr);
        assert_eq!(res.value, 0);
        assert_eq!(ctx.current_dialog_type(), DialogType::Msg);
        // Session stayed claimed by msg (activate only flips when idle),
        // but the helper task was terminated and the lock released
        assert_eq!(ctx.access_task_state(), "initializing");
    }

    #[test]
    fn test_wrong_type_on_status_poll() {
        let mut ctx = ctx();
        assert_eq!(ctx.savedata_get_status(), SCE_ERROR_UTILITY_WRONG_TYPE as i32);
        assert_eq!(ctx.osk_get_status(), SCE_ERROR_UTILITY_WRONG_TYPE as i32);
    }

    #[test]
    fn test_shutdown_requires_matching_type() {
        let mut ctx = ctx();
        let addr = USER_MEM_BASE;
        write_common_block(&mut ctx, addr);
        assert_eq!(ctx.osk_init_start(addr).value, 0);
        assert_eq!(
            ctx.msg_dialog_shutdown_start().value,
            SCE_ERROR_UTILITY_WRONG_TYPE as i32
        );
    }

    #[test]
    fn test_av_module_id_space() {
        let mut ctx = ctx();
        assert_eq!(ctx.load_av_module(0).value, 0);
        assert!(ctx.loaded_modules().is_loaded(0x300));
        assert_eq!(ctx.load_av_module(8).value, SCE_ERROR_AV_MODULE_BAD_ID as i32);

        // av_atrac3plus piggybacks on avcodec being loaded
        assert_eq!(ctx.load_av_module(2).value, 0);
        assert!(ctx.media().atrac_module().is_some());
        assert_eq!(ctx.unload_av_module(2).value, 0);
        assert!(ctx.media().atrac_module().is_none());
    }

    #[test]
    fn test_module_load_delay_shape() {
        let mut ctx = ctx();
        assert_eq!(ctx.load_module(0x3FF).delay_us, 130);
        assert_eq!(ctx.unload_module(0x3FF).delay_us, 110);
        assert_eq!(ctx.load_module(0x100).delay_us, 25_000);
        assert_eq!(ctx.unload_module(0x100).delay_us, 400);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut ctx = ctx();
        let addr = USER_MEM_BASE;
        write_common_block(&mut ctx, addr);
        ctx.load_module(0x100);
        ctx.msg_dialog_init_start(addr);

        ctx.reset();
        assert!(!ctx.dialog_active());
        assert!(!ctx.loaded_modules().is_loaded(0x100));
        assert_eq!(ctx.msg_dialog_get_status(), SCE_ERROR_UTILITY_WRONG_TYPE as i32);
    }
}
