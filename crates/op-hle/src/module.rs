//! Firmware utility module registry
//!
//! Games pull optional firmware modules (networking, codecs, NP) in at
//! runtime through sceUtilityLoadModule and friends. We don't run any
//! module code; loading means reserving the module's memory footprint
//! and remembering the id, which is all games observe.

use std::collections::BTreeMap;

use op_memory::UserMemoryAllocator;
use tracing::{debug, info, warn};

use crate::errors::{
    SCE_ERROR_MODULE_ALREADY_LOADED, SCE_ERROR_MODULE_BAD_ID, SCE_ERROR_MODULE_NOT_LOADED,
    SCE_KERNEL_ERROR_LIBRARY_NOTFOUND,
};
use crate::media::MediaEngineState;

/// Module load/unload notification. `state` is 1 for load, -1 for unload.
pub type ModuleNotify = fn(&mut MediaEngineState, state: i32, load_addr: u32, total_size: u32);

/// Static description of one loadable firmware module
pub struct ModuleInfo {
    pub id: u32,
    pub size: u32,
    pub name: &'static str,
    /// Module ids that must already be loaded
    pub dependencies: &'static [u32],
    pub notify: Option<ModuleNotify>,
}

impl ModuleInfo {
    const fn new(id: u32, size: u32, name: &'static str) -> Self {
        Self { id, size, name, dependencies: &[], notify: None }
    }

    const fn with_deps(id: u32, size: u32, name: &'static str, deps: &'static [u32]) -> Self {
        Self { id, size, name, dependencies: deps, notify: None }
    }

    const fn with_notify(id: u32, size: u32, name: &'static str, notify: ModuleNotify) -> Self {
        Self { id, size, name, dependencies: &[], notify: Some(notify) }
    }

    const fn with_deps_notify(
        id: u32,
        size: u32,
        name: &'static str,
        deps: &'static [u32],
        notify: ModuleNotify,
    ) -> Self {
        Self { id, size, name, dependencies: deps, notify: Some(notify) }
    }
}

const HTTP_DEPS: &[u32] = &[0x102, 0x103, 0x104];
const SSL_DEPS: &[u32] = &[0x102];
const HTTP_STORAGE_DEPS: &[u32] = &[0x100, 0x102, 0x103, 0x104, 0x105];
const ATRAC3PLUS_DEPS: &[u32] = &[0x300];
const MPEGBASE_DEPS: &[u32] = &[0x300];
const MP4_DEPS: &[u32] = &[0x300];

/// Every module the firmware knows how to load. Sizes are the observed
/// memory footprints; several modules are resident and cost nothing.
static MODULE_CATALOG: &[ModuleInfo] = &[
    ModuleInfo::new(0x100, 0x0001_4000, "net_common"),
    ModuleInfo::new(0x101, 0x0002_0000, "net_adhoc"),
    ModuleInfo::new(0x102, 0x0005_8000, "net_inet"),
    ModuleInfo::new(0x103, 0x0000_6000, "net_parse_uri"),
    ModuleInfo::new(0x104, 0x0000_2000, "net_parse_http"),
    ModuleInfo::with_deps(0x105, 0x0002_8000, "net_http", HTTP_DEPS),
    ModuleInfo::with_deps(0x106, 0x0004_4000, "net_ssl", SSL_DEPS),
    ModuleInfo::new(0x107, 0x0001_0000, "unk_0x107"),
    ModuleInfo::with_deps(0x108, 0x0000_8000, "usb_pspcm", HTTP_STORAGE_DEPS),
    ModuleInfo::new(0x200, 0, "usb_mic"),
    ModuleInfo::new(0x201, 0, "usb_cam"),
    ModuleInfo::new(0x202, 0, "usb_gps"),
    ModuleInfo::new(0x203, 0, "usb_unk_0x203"),
    ModuleInfo::new(0x2ff, 0, "unk_0x2ff"),
    ModuleInfo::with_notify(0x300, 0, "av_avcodec", MediaEngineState::notify_avcodec),
    ModuleInfo::new(0x301, 0, "av_sascore"),
    ModuleInfo::with_deps_notify(
        0x302,
        0x0000_8000,
        "av_atrac3plus",
        ATRAC3PLUS_DEPS,
        MediaEngineState::notify_atrac,
    ),
    ModuleInfo::with_deps(0x303, 0x0000_c000, "av_mpegbase", MPEGBASE_DEPS),
    ModuleInfo::new(0x304, 0x0000_4000, "av_mp3"),
    ModuleInfo::new(0x305, 0x0000_a300, "av_vaudio"),
    ModuleInfo::new(0x306, 0x0000_4000, "av_aac"),
    ModuleInfo::new(0x307, 0, "av_g729"),
    ModuleInfo::with_deps(0x308, 0x0003_c000, "av_mp4", MP4_DEPS),
    ModuleInfo::new(0x3fe, 0, "me_stuff"),
    ModuleInfo::new(0x3ff, 0, "me_core"),
    ModuleInfo::new(0x400, 0x0000_c000, "np_common"),
    ModuleInfo::new(0x401, 0x0001_8000, "np_service"),
    ModuleInfo::new(0x402, 0x0004_8000, "np_matching2"),
    ModuleInfo::new(0x403, 0x0000_e000, "np_unk_0x403"),
    ModuleInfo::new(0x500, 0, "np_drm"),
    ModuleInfo::new(0x600, 0, "irda"),
    ModuleInfo::new(0x601, 0, "unk_0x601"),
];

pub fn module_info(id: u32) -> Option<&'static ModuleInfo> {
    MODULE_CATALOG.iter().find(|m| m.id == id)
}

/// Tracks which utility modules a game has loaded and where their memory
/// landed. Addresses are 0 for footprint-free modules.
#[derive(Debug, Default)]
pub struct LoadedModules {
    modules: BTreeMap<u32, u32>,
}

impl LoadedModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, id: u32) -> bool {
        self.modules.contains_key(&id)
    }

    pub fn address_of(&self, id: u32) -> Option<u32> {
        self.modules.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.modules.iter().map(|(&id, &addr)| (id, addr))
    }

    /// Reserve memory for a module and record it as loaded. Returns 0 or
    /// a negative SCE status code.
    pub fn load(
        &mut self,
        id: u32,
        alloc: &mut UserMemoryAllocator,
        media: &mut MediaEngineState,
    ) -> i32 {
        let Some(info) = module_info(id) else {
            warn!("load of unknown utility module 0x{:x}", id);
            return SCE_ERROR_MODULE_BAD_ID as i32;
        };
        if self.is_loaded(id) {
            return SCE_ERROR_MODULE_ALREADY_LOADED as i32;
        }
        // Kamen Rider Climax Heroes OOO depends on this check failing
        for &dep in info.dependencies {
            if !self.is_loaded(dep) {
                debug!(
                    "module 0x{:x} ({}) missing dependency 0x{:x}",
                    id, info.name, dep
                );
                return SCE_KERNEL_ERROR_LIBRARY_NOTFOUND as i32;
            }
        }

        let address = if info.size != 0 {
            let tag = format!("UtilityModule/{:3x}_{}", id, info.name);
            alloc.alloc(info.size, &tag).unwrap_or(0)
        } else {
            0
        };
        self.modules.insert(id, address);
        if let Some(notify) = info.notify {
            notify(media, 1, address, info.size);
        }
        info!("loaded utility module 0x{:x} ({}) at 0x{:08x}", id, info.name, address);
        0
    }

    /// Release a module's memory and forget it. Returns 0 or a negative
    /// SCE status code.
    pub fn unload(
        &mut self,
        id: u32,
        alloc: &mut UserMemoryAllocator,
        media: &mut MediaEngineState,
    ) -> i32 {
        let Some(info) = module_info(id) else {
            return SCE_ERROR_MODULE_BAD_ID as i32;
        };
        let Some(address) = self.modules.remove(&id) else {
            return SCE_ERROR_MODULE_NOT_LOADED as i32;
        };
        if address != 0 {
            alloc.free(address);
        }
        if let Some(notify) = info.notify {
            notify(media, -1, 0, 0);
        }
        info!("unloaded utility module 0x{:x} ({})", id, info.name);
        0
    }

    /// Memory range a loaded module occupies, for debuggers
    pub fn memory_range(&self, id: u32) -> Option<(u32, u32)> {
        let info = module_info(id)?;
        let addr = self.address_of(id)?;
        Some((addr, info.size))
    }

    /// Replace the whole set, as when restoring a snapshot
    pub fn replace(&mut self, modules: BTreeMap<u32, u32>) {
        self.modules = modules;
    }

    pub fn snapshot(&self) -> BTreeMap<u32, u32> {
        self.modules.clone()
    }

    pub fn clear(&mut self) {
        self.modules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (LoadedModules, UserMemoryAllocator, MediaEngineState) {
        (
            LoadedModules::new(),
            UserMemoryAllocator::new(),
            MediaEngineState::default(),
        )
    }

    #[test]
    fn test_load_reserves_memory() {
        let (mut loaded, mut alloc, mut media) = fixture();
        assert_eq!(loaded.load(0x100, &mut alloc, &mut media), 0);
        assert!(loaded.is_loaded(0x100));
        let (addr, size) = loaded.memory_range(0x100).unwrap();
        assert_ne!(addr, 0);
        assert_eq!(size, 0x14000);
        assert_eq!(alloc.allocated_bytes(), 0x14000);

        assert_eq!(loaded.unload(0x100, &mut alloc, &mut media), 0);
        assert_eq!(alloc.allocated_bytes(), 0);
    }

    #[test]
    fn test_double_load_rejected() {
        let (mut loaded, mut alloc, mut media) = fixture();
        assert_eq!(loaded.load(0x100, &mut alloc, &mut media), 0);
        assert_eq!(
            loaded.load(0x100, &mut alloc, &mut media),
            SCE_ERROR_MODULE_ALREADY_LOADED as i32
        );
    }

    #[test]
    fn test_unknown_module_rejected() {
        let (mut loaded, mut alloc, mut media) = fixture();
        assert_eq!(
            loaded.load(0x999, &mut alloc, &mut media),
            SCE_ERROR_MODULE_BAD_ID as i32
        );
        assert_eq!(
            loaded.unload(0x999, &mut alloc, &mut media),
            SCE_ERROR_MODULE_BAD_ID as i32
        );
    }

    #[test]
    fn test_unload_without_load_rejected() {
        let (mut loaded, mut alloc, mut media) = fixture();
        assert_eq!(
            loaded.unload(0x100, &mut alloc, &mut media),
            SCE_ERROR_MODULE_NOT_LOADED as i32
        );
    }

    #[test]
    fn test_dependencies_enforced() {
        let (mut loaded, mut alloc, mut media) = fixture();
        // net_http needs inet + both parsers loaded first
        assert_eq!(
            loaded.load(0x105, &mut alloc, &mut media),
            SCE_KERNEL_ERROR_LIBRARY_NOTFOUND as i32
        );
        for dep in [0x102, 0x103, 0x104] {
            assert_eq!(loaded.load(dep, &mut alloc, &mut media), 0);
        }
        assert_eq!(loaded.load(0x105, &mut alloc, &mut media), 0);
    }

    #[test]
    fn test_zero_size_module_loads_at_zero() {
        let (mut loaded, mut alloc, mut media) = fixture();
        assert_eq!(loaded.load(0x600, &mut alloc, &mut media), 0);
        assert_eq!(loaded.address_of(0x600), Some(0));
        assert_eq!(alloc.allocated_bytes(), 0);
    }

    #[test]
    fn test_atrac_notify_fires() {
        let (mut loaded, mut alloc, mut media) = fixture();
        assert_eq!(loaded.load(0x300, &mut alloc, &mut media), 0);
        assert_eq!(loaded.load(0x302, &mut alloc, &mut media), 0);
        assert!(media.atrac_module().is_some());

        assert_eq!(loaded.unload(0x302, &mut alloc, &mut media), 0);
        assert!(media.atrac_module().is_none());
    }
}
