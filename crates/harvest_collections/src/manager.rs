//! Collection manager
//!
//! Owns every group and answers the one question the looting decision
//! asks: is this item collectible here, and what should happen to it.
//!
//! Loading runs in a fixed order: validate each definition file, build its
//! group, probe every loaded item against every rule to index membership,
//! then mark the manager ready. Any failure leaves it not ready, and every
//! query then answers "not collectible".
//!
//! Lock order: the catalog lock is taken before any collection's own lock.
//! The added-item queue and the reconcile timestamp are never held while
//! taking the catalog.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use harvest_conditions::{ConditionMatcher, Scope};
use harvest_core::{Form, FormId, FormStore, FormType, Notifier, ObjectType, Translations};
use harvest_data::DataCase;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collection::{Collection, ObservationRecord};
use crate::definition::validate_group;
use crate::error::{CollectionError, CollectionResult};
use crate::factory::build_group;
use crate::group::CollectionGroup;
use crate::policy::{CollectibleHandling, CollectionPolicy};

/// Default interval between full inventory sweeps
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(5);

/// An item that entered the player's inventory
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AddedItem {
    /// Item instance
    pub item: FormId,
    /// Base form
    pub form: FormId,
    /// Where it came from, if known
    pub scope: Option<Scope>,
    pub game_time: f32,
    pub place: FormId,
}

impl AddedItem {
    /// Create an item with unknown origin
    pub fn new(item: FormId, form: FormId) -> Self {
        Self {
            item,
            form,
            scope: None,
            game_time: 0.0,
            place: FormId::NONE,
        }
    }

    /// Record where it was found
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Record when and where it was acquired
    pub fn at(mut self, game_time: f32, place: FormId) -> Self {
        self.game_time = game_time;
        self.place = place;
        self
    }
}

/// Saved state of one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSnapshot {
    pub group: String,
    pub collection: String,
    /// Members found after construction
    pub members: Vec<FormId>,
    pub observed: Vec<ObservationRecord>,
}

/// Outcome of a load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub files: usize,
    pub rejected_files: usize,
    pub groups: usize,
    pub collections: usize,
    /// Distinct forms belonging to at least one collection
    pub indexed_forms: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CollectionRef {
    group: usize,
    collection: usize,
}

#[derive(Debug, Default)]
struct Catalog {
    groups: Vec<CollectionGroup>,
    by_form: HashMap<FormId, Vec<CollectionRef>>,
    by_type: HashMap<ObjectType, Vec<CollectionRef>>,
}

impl Catalog {
    fn collection(&self, at: CollectionRef) -> Option<&Collection> {
        self.groups.get(at.group)?.collections().get(at.collection)
    }

    fn find(&self, group: &str, name: &str) -> Option<CollectionRef> {
        let group_index = self.groups.iter().position(|g| g.name() == group)?;
        let collection = self.groups[group_index]
            .collections()
            .iter()
            .position(|c| c.name() == name)?;
        Some(CollectionRef {
            group: group_index,
            collection,
        })
    }

    fn refs(&self) -> Vec<CollectionRef> {
        self.groups
            .iter()
            .enumerate()
            .flat_map(|(group, g)| (0..g.len()).map(move |collection| CollectionRef { group, collection }))
            .collect()
    }

    fn index_member(&mut self, form: FormId, at: CollectionRef) {
        let refs = self.by_form.entry(form).or_default();
        if !refs.contains(&at) {
            refs.push(at);
        }
    }

    fn index_type(&mut self, object_type: ObjectType, at: CollectionRef) {
        let refs = self.by_type.entry(object_type).or_default();
        if !refs.contains(&at) {
            refs.push(at);
        }
    }

    /// Probe every loaded item against every rule
    fn build_index(&mut self, store: &dyn FormStore, data: &DataCase) {
        self.by_form.clear();
        self.by_type.clear();
        let refs = self.refs();

        for form_type in FormType::ALL.iter().filter(|t| t.is_inventory_item()) {
            for form in store.forms_of_type(*form_type) {
                if form.id.is_dynamic() {
                    continue;
                }
                let object_type = data.object_type_for_form(&form);
                let matcher = ConditionMatcher::membership_probe(&form, object_type);
                for at in &refs {
                    let matched = self
                        .collection(*at)
                        .map(|c| c.is_member_of(form.id) || c.matches_filter(&matcher))
                        .unwrap_or(false);
                    if matched {
                        self.index_member(form.id, *at);
                        self.index_type(object_type, *at);
                    }
                }
            }
        }
        for at in refs {
            let members = self.collection(at).map(|c| c.members()).unwrap_or_default();
            for member in members {
                self.index_member(member, at);
            }
        }
    }
}

/// Owner of every collection group
pub struct CollectionManager {
    catalog: RwLock<Catalog>,
    added_items: Mutex<Vec<AddedItem>>,
    last_reconcile: Mutex<Option<Instant>>,
    reconcile_interval: Duration,
    ready: AtomicBool,
    notifier: Arc<dyn Notifier>,
    translations: Translations,
}

impl CollectionManager {
    /// Create an empty, not-ready manager
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            catalog: RwLock::new(Catalog::default()),
            added_items: Mutex::new(Vec::new()),
            last_reconcile: Mutex::new(None),
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            ready: AtomicBool::new(false),
            notifier,
            translations: Translations::new(),
        }
    }

    /// Use localized notification text
    pub fn with_translations(mut self, translations: Translations) -> Self {
        self.translations = translations;
        self
    }

    /// Set the minimum time between inventory sweeps
    pub fn with_reconcile_interval(mut self, interval: Duration) -> Self {
        self.reconcile_interval = interval;
        self
    }

    /// Collections loaded and indexed
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Load every file in `directory` whose name ends with `suffix`.
    ///
    /// A file that fails validation contributes no collections; the others
    /// still load. An unreadable directory disables collections.
    pub fn load(
        &self,
        directory: &Path,
        suffix: &str,
        store: &dyn FormStore,
        data: &DataCase,
    ) -> CollectionResult<LoadReport> {
        self.ready.store(false, Ordering::Release);
        let sources = match read_sources(directory, suffix) {
            Ok(sources) => sources,
            Err(e) => {
                log::error!("Collections disabled, cannot read {}: {}", directory.display(), e);
                return Err(e);
            }
        };
        Ok(self.load_sources(&sources, store, data))
    }

    /// Load already-read definition documents, as (group name, text) pairs
    pub fn load_sources(&self, sources: &[(String, String)], store: &dyn FormStore, data: &DataCase) -> LoadReport {
        self.ready.store(false, Ordering::Release);
        let mut report = LoadReport {
            files: sources.len(),
            ..LoadReport::default()
        };
        let mut groups = Vec::new();
        for (name, text) in sources {
            let definition = serde_json::from_str::<Value>(text)
                .map_err(CollectionError::from)
                .and_then(|document| validate_group(&document, name));
            match definition {
                Ok(definition) => groups.push(build_group(name, &definition, store)),
                Err(e) => {
                    log::error!("Rejected collection file {}: {}", name, e);
                    report.rejected_files += 1;
                }
            }
        }

        let mut catalog = self.catalog.write();
        catalog.groups = groups;
        catalog.build_index(store, data);
        report.groups = catalog.groups.len();
        report.collections = catalog.groups.iter().map(|g| g.len()).sum();
        report.indexed_forms = catalog.by_form.len();
        drop(catalog);

        self.ready.store(true, Ordering::Release);
        log::info!(
            "Collections ready: {} groups, {} collections, {} member forms",
            report.groups,
            report.collections,
            report.indexed_forms
        );
        report
    }

    /// Whether an item belongs to a collection that wants it now, and
    /// the strongest handling among those collections. With `record_dups`
    /// items already recorded still count.
    pub fn treat_as_collectible(&self, matcher: &ConditionMatcher<'_>, record_dups: bool) -> (bool, CollectibleHandling) {
        if !self.is_ready() {
            return (false, CollectibleHandling::Leave);
        }
        let catalog = self.catalog.read();
        let Some(refs) = catalog.by_form.get(&matcher.target().id) else {
            return (false, CollectibleHandling::Leave);
        };
        let handling = refs
            .iter()
            .filter_map(|at| catalog.collection(*at))
            .filter(|collection| collection.is_collectible_for(matcher, record_dups))
            .map(|collection| collection.policy().action)
            .max();
        match handling {
            Some(handling) => (true, handling),
            None => (false, CollectibleHandling::Leave),
        }
    }

    /// Whether any collection wants items of this type
    pub fn is_collectible_type(&self, object_type: ObjectType) -> bool {
        self.is_ready() && self.catalog.read().by_type.contains_key(&object_type)
    }

    /// Queue an item reported by the host's inventory events
    pub fn enqueue_added_item(&self, item: AddedItem) {
        if !self.is_ready() {
            return;
        }
        self.added_items.lock().push(item);
    }

    /// Items waiting for the next drain
    pub fn queued_items(&self) -> usize {
        self.added_items.lock().len()
    }

    /// Drain the queue in arrival order. Returns the number of sightings
    /// recorded.
    pub fn process_added_items(&self, store: &dyn FormStore, data: &DataCase) -> usize {
        let queued = std::mem::take(&mut *self.added_items.lock());
        if queued.is_empty() {
            return 0;
        }
        let mut recorded = 0;
        for item in &queued {
            let Some(form) = store.lookup_form(item.form) else {
                continue;
            };
            recorded += self.add_to_relevant_collections(&form, data.object_type_for_form(&form), item);
        }
        recorded
    }

    /// Record an item in every collection it belongs to and that accepts
    /// it from where it was found
    pub fn add_to_relevant_collections(&self, form: &Form, object_type: ObjectType, item: &AddedItem) -> usize {
        if !self.is_ready() {
            return 0;
        }
        let mut matcher = ConditionMatcher::new(form).with_object_type(object_type);
        if let Some(scope) = item.scope {
            matcher = matcher.found_in(scope);
        }

        let mut messages = Vec::new();
        {
            let catalog = self.catalog.read();
            let Some(refs) = catalog.by_form.get(&form.id) else {
                return 0;
            };
            for collection in refs.iter().filter_map(|at| catalog.collection(*at)) {
                if !collection.in_scope_and_collectible_for(&matcher) {
                    continue;
                }
                if collection.record_item(item.item, form.id, item.game_time, item.place) && collection.policy().notify {
                    messages.push(collection.notification_text(&form.name, &self.translations));
                }
            }
        }
        let recorded = messages.len();
        for message in &messages {
            self.notifier.notify(message);
        }
        recorded
    }

    /// Full inventory sweep, at most once per reconcile interval. Returns
    /// `None` when throttled.
    pub fn reconcile_inventory(
        &self,
        inventory: &[AddedItem],
        store: &dyn FormStore,
        data: &DataCase,
        now: Instant,
    ) -> Option<usize> {
        if !self.is_ready() {
            return None;
        }
        {
            let mut last = self.last_reconcile.lock();
            if let Some(previous) = *last {
                if now.saturating_duration_since(previous) < self.reconcile_interval {
                    return None;
                }
            }
            *last = Some(now);
        }
        let mut recorded = 0;
        for item in inventory {
            if let Some(form) = store.lookup_form(item.form) {
                recorded += self.add_to_relevant_collections(&form, data.object_type_for_form(&form), item);
            }
        }
        if recorded > 0 {
            log::debug!("Inventory sweep recorded {} items", recorded);
        }
        Some(recorded)
    }

    /// Replace a group's default policy
    pub fn update_group_policy(&self, group: &str, policy: CollectionPolicy) -> bool {
        let mut catalog = self.catalog.write();
        match catalog.groups.iter_mut().find(|g| g.name() == group) {
            Some(found) => {
                found.sync_default_policy(policy);
                true
            }
            None => false,
        }
    }

    /// Run `f` against one collection
    pub fn with_collection<R>(&self, group: &str, name: &str, f: impl FnOnce(&Collection) -> R) -> Option<R> {
        let catalog = self.catalog.read();
        let at = catalog.find(group, name)?;
        catalog.collection(at).map(f)
    }

    pub fn group_names(&self) -> Vec<String> {
        self.catalog.read().groups.iter().map(|g| g.name().to_string()).collect()
    }

    pub fn collection_count(&self) -> usize {
        self.catalog.read().groups.iter().map(|g| g.len()).sum()
    }

    /// Discovered members and sightings of every collection
    pub fn snapshot(&self) -> Vec<CollectionSnapshot> {
        let catalog = self.catalog.read();
        catalog
            .groups
            .iter()
            .flat_map(|group| {
                group.collections().iter().map(move |collection| CollectionSnapshot {
                    group: group.name().to_string(),
                    collection: collection.name().to_string(),
                    members: collection.discovered_members(),
                    observed: collection.observed(),
                })
            })
            .collect()
    }

    /// Reapply saved state. Snapshots naming an unknown group or
    /// collection are skipped. Returns the number applied.
    pub fn restore(&self, snapshots: &[CollectionSnapshot]) -> usize {
        let mut catalog = self.catalog.write();
        let mut applied = 0;
        for snapshot in snapshots {
            let Some(at) = catalog.find(&snapshot.group, &snapshot.collection) else {
                log::warn!(
                    "Saved collection {}/{} no longer defined",
                    snapshot.group,
                    snapshot.collection
                );
                continue;
            };
            let members: Vec<FormId> = snapshot.members.iter().copied().filter(|id| !id.is_dynamic()).collect();
            if let Some(collection) = catalog.collection(at) {
                collection.restore(members.iter().copied(), snapshot.observed.iter().copied());
            }
            for member in members {
                catalog.index_member(member, at);
            }
            applied += 1;
        }
        applied
    }

    /// Snapshot as JSON
    pub fn serialize_membership(&self) -> CollectionResult<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Restore from [`serialize_membership`](Self::serialize_membership) output
    pub fn deserialize_membership(&self, text: &str) -> CollectionResult<usize> {
        let snapshots: Vec<CollectionSnapshot> = serde_json::from_str(text)?;
        Ok(self.restore(&snapshots))
    }

    /// Forget every sighting and queued item
    pub fn reset_for_new_game(&self) {
        self.added_items.lock().clear();
        *self.last_reconcile.lock() = None;
        let catalog = self.catalog.read();
        for group in &catalog.groups {
            for collection in group.collections() {
                collection.reset();
            }
        }
    }
}

fn read_sources(directory: &Path, suffix: &str) -> CollectionResult<Vec<(String, String)>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.ends_with(suffix))
            .unwrap_or(false);
        if matches && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut sources = Vec::new();
    for path in paths {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        match std::fs::read_to_string(&path) {
            Ok(text) => sources.push((name, text)),
            Err(e) => log::error!("Cannot read {}: {}", path.display(), e),
        }
    }
    Ok(sources)
}
