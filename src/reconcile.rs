//! Re-derives entry placement from folder/association state and applies it to
//! the host surface as a minimal series of moves.

use crate::host::LayoutSurface;
use crate::identity::{resolve_all, EntryHandle};
use crate::models::{EntryId, Folder, FolderId, HandleKey, Placement, Region, RegionPlacement};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub pass: u64,
    pub moves: usize,
    pub regions_created: usize,
    pub regions_updated: usize,
    pub regions_reordered: usize,
    pub regions_removed: usize,
    pub stale_associations: usize,
    pub placement: Placement,
}

impl PassReport {
    pub fn is_noop(&self) -> bool {
        self.moves == 0
            && self.regions_created == 0
            && self.regions_updated == 0
            && self.regions_reordered == 0
            && self.regions_removed == 0
    }
}

#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    busy: AtomicBool,
    passes: AtomicU64,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a pass is mutating the surface. Host notifications observed
    /// in this window are caused by the pass itself.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    /// Runs one complete pass. Returns `None` if a pass is already running.
    pub fn run_pass(
        &self,
        folders: &[Folder],
        associations: &BTreeMap<EntryId, FolderId>,
        entries: &[EntryHandle],
        surface: &dyn LayoutSurface,
    ) -> Option<PassReport> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("reconciliation already in progress; nested pass skipped");
            return None;
        }
        let _guard = BusyGuard(&self.busy);
        let pass = self.passes.fetch_add(1, Ordering::SeqCst) + 1;
        let _span = tracing::debug_span!("reconcile_pass", pass).entered();

        let (placement, stale_associations) = plan(folders, associations, entries);
        let mut report = PassReport {
            pass,
            stale_associations,
            ..PassReport::default()
        };

        let mut region_order = sync_regions(folders, surface, &mut report);
        relocate_handles(&placement, &region_order, surface, &mut report);
        prune_regions(folders, &mut region_order, surface, &mut report);

        report.placement = placement;
        tracing::debug!(
            moves = report.moves,
            created = report.regions_created,
            removed = report.regions_removed,
            stale = report.stale_associations,
            "reconciliation pass finished"
        );
        Some(report)
    }
}

/// Pure placement for the given inputs: unfiled region first, then folders in order.
pub fn plan_placement(
    folders: &[Folder],
    associations: &BTreeMap<EntryId, FolderId>,
    entries: &[EntryHandle],
) -> Placement {
    plan(folders, associations, entries).0
}

fn plan(
    folders: &[Folder],
    associations: &BTreeMap<EntryId, FolderId>,
    entries: &[EntryHandle],
) -> (Placement, usize) {
    let live = folders.iter().map(|folder| &folder.id).collect::<HashSet<_>>();
    let mut unfiled = Vec::new();
    let mut filed: HashMap<&FolderId, Vec<HandleKey>> = HashMap::new();
    let mut seen = HashSet::new();
    let mut stale = 0usize;

    for entry in resolve_all(entries) {
        if !seen.insert(entry.key) {
            tracing::warn!(handle = entry.key.0, "host reported the same handle twice; ignoring repeat");
            continue;
        }
        let target = if entry.reserved {
            None
        } else {
            associations.get(&entry.id)
        };
        match target {
            Some(folder) if live.contains(folder) => {
                filed.entry(folder).or_default().push(entry.key);
            }
            Some(folder) => {
                stale += 1;
                tracing::debug!(entry_id = %entry.id, folder_id = %folder, "stale association rendered as unfiled");
                unfiled.push(entry.key);
            }
            None => unfiled.push(entry.key),
        }
    }

    let mut regions = Vec::with_capacity(folders.len() + 1);
    regions.push(RegionPlacement {
        region: Region::Unfiled,
        collapsed: false,
        handles: unfiled,
    });
    for folder in folders {
        regions.push(RegionPlacement {
            region: Region::Folder(folder.id.clone()),
            collapsed: folder.collapsed,
            handles: filed.remove(&folder.id).unwrap_or_default(),
        });
    }

    (Placement { regions }, stale)
}

/// Makes sure every folder has a region at its display position and returns the
/// resulting region order (stale regions trail).
fn sync_regions(folders: &[Folder], surface: &dyn LayoutSurface, report: &mut PassReport) -> Vec<FolderId> {
    let existing = surface.folder_regions();
    let mut order = existing.iter().map(|view| view.id.clone()).collect::<Vec<_>>();

    for (position, folder) in folders.iter().enumerate() {
        let Some(view) = existing.iter().find(|view| view.id == folder.id) else {
            surface.create_folder_region(folder, position);
            order.insert(position.min(order.len()), folder.id.clone());
            report.regions_created += 1;
            continue;
        };

        if view.label != folder.name || view.collapsed != folder.collapsed {
            surface.update_folder_region(folder);
            report.regions_updated += 1;
        }

        if let Some(current) = order.iter().position(|id| id == &folder.id) {
            if current != position {
                surface.move_folder_region(&folder.id, position);
                let id = order.remove(current);
                order.insert(position.min(order.len()), id);
                report.regions_reordered += 1;
            }
        }
    }

    order
}

fn relocate_handles(
    placement: &Placement,
    region_order: &[FolderId],
    surface: &dyn LayoutSurface,
    report: &mut PassReport,
) {
    let mut contents: HashMap<Region, Vec<HandleKey>> = HashMap::new();
    contents.insert(Region::Unfiled, surface.region_contents(&Region::Unfiled));
    for id in region_order {
        let region = Region::Folder(id.clone());
        let handles = surface.region_contents(&region);
        contents.insert(region, handles);
    }

    let mut location = HashMap::new();
    for (region, handles) in &contents {
        for handle in handles {
            location.insert(*handle, region.clone());
        }
    }

    for target in &placement.regions {
        for (index, handle) in target.handles.iter().enumerate() {
            let in_place = contents
                .get(&target.region)
                .and_then(|handles| handles.get(index))
                == Some(handle);
            if in_place {
                continue;
            }

            if let Some(from) = location.get(handle) {
                if let Some(handles) = contents.get_mut(from) {
                    handles.retain(|existing| existing != handle);
                }
            }
            let handles = contents.entry(target.region.clone()).or_default();
            let at = index.min(handles.len());
            handles.insert(at, *handle);
            location.insert(*handle, target.region.clone());

            surface.move_handle(*handle, &target.region, at);
            report.moves += 1;
        }
    }
}

fn prune_regions(
    folders: &[Folder],
    region_order: &mut Vec<FolderId>,
    surface: &dyn LayoutSurface,
    report: &mut PassReport,
) {
    let live = folders.iter().map(|folder| &folder.id).collect::<HashSet<_>>();
    let orphaned = region_order
        .iter()
        .filter(|id| !live.contains(id))
        .cloned()
        .collect::<Vec<_>>();

    for id in orphaned {
        let remaining = surface.region_contents(&Region::Folder(id.clone()));
        if !remaining.is_empty() {
            tracing::warn!(
                folder_id = %id,
                handles = remaining.len(),
                "region of a deleted folder still holds handles unknown to the collection; leaving it"
            );
            continue;
        }
        surface.remove_folder_region(&id);
        region_order.retain(|existing| existing != &id);
        report.regions_removed += 1;
    }
}
