//! Session-scoped report data: invariant fields, image slots, and the
//! transient defect selection.
//!
//! One `InspectionSession` is exclusively owned by one workflow instance for
//! the lifetime of the device session. Invariant fields and images persist
//! across repeated inspections of the same part/report and are cleared only
//! by explicit lifecycle transitions (new part, new project).

use serde::Serialize;
use tracing::warn;

/// First valid report page. The counter must never be observed below this.
pub const FIRST_PAGE: u32 = 1;

// ============================================================================
// Image Slots
// ============================================================================

/// Named image slots of a report page.
///
/// A fixed set instead of free-form string keys: every photo the workflow
/// captures lands in exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    /// Part label photo taken at the Label state
    PartId,
    /// Wide context photo taken at the Context state
    Context,
    /// Close-up photo taken at the Detail state
    Detail,
}

impl ImageSlot {
    /// All slots, in report order.
    pub const ALL: [ImageSlot; 3] = [ImageSlot::PartId, ImageSlot::Context, ImageSlot::Detail];

    /// Report key for this slot (stable wire/report identifier).
    pub fn key(self) -> &'static str {
        match self {
            ImageSlot::PartId => "image-partid",
            ImageSlot::Context => "image-context",
            ImageSlot::Detail => "image-detail",
        }
    }

    /// Parse a report key back into a slot.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.key() == key)
    }
}

impl std::fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Encoded image bytes per slot.
#[derive(Debug, Clone, Default)]
pub struct SessionImages {
    part_id: Option<Vec<u8>>,
    context: Option<Vec<u8>>,
    detail: Option<Vec<u8>>,
}

impl SessionImages {
    /// Store (or clear, with `None`) the bytes for a slot.
    pub fn set(&mut self, slot: ImageSlot, bytes: Option<Vec<u8>>) {
        match slot {
            ImageSlot::PartId => self.part_id = bytes,
            ImageSlot::Context => self.context = bytes,
            ImageSlot::Detail => self.detail = bytes,
        }
    }

    pub fn get(&self, slot: ImageSlot) -> Option<&[u8]> {
        match slot {
            ImageSlot::PartId => self.part_id.as_deref(),
            ImageSlot::Context => self.context.as_deref(),
            ImageSlot::Detail => self.detail.as_deref(),
        }
    }

    /// Slots that currently hold an image, in report order.
    pub fn filled(&self) -> Vec<ImageSlot> {
        ImageSlot::ALL
            .into_iter()
            .filter(|slot| self.get(*slot).is_some())
            .collect()
    }

    pub fn clear(&mut self) {
        self.part_id = None;
        self.context = None;
        self.detail = None;
    }
}

// ============================================================================
// Inspection Session
// ============================================================================

/// Mutable session record owned by the workflow.
///
/// Wrapped behind the workflow's serialization point (one `Mutex` in the
/// request layer) — never mutated concurrently.
#[derive(Debug, Clone)]
pub struct InspectionSession {
    /// Inspector name, set at the Project state
    pub technician: String,
    /// Upper-cased project identifier of the loaded catalog
    pub project: String,
    /// Part number entered at Standby
    pub part_number: String,
    /// Serial number entered at Standby
    pub serial_number: String,
    /// Report date stamped at Standby (`YYYY-MM-DD`)
    pub date: String,
    /// Current report page, >= [`FIRST_PAGE`]
    pub page: u32,
    /// Invariant report images
    pub images: SessionImages,
}

impl Default for InspectionSession {
    fn default() -> Self {
        Self {
            technician: String::new(),
            project: String::new(),
            part_number: String::new(),
            serial_number: String::new(),
            date: String::new(),
            page: FIRST_PAGE,
            images: SessionImages::default(),
        }
    }
}

impl InspectionSession {
    /// Reset the page counter for a new part/project/report.
    pub fn reset_page(&mut self) {
        self.page = FIRST_PAGE;
    }

    /// Advance to the next report page.
    pub fn next_page(&mut self) {
        self.page += 1;
    }

    /// Walk the page counter back after a dropped inspection.
    ///
    /// The counter must never go below [`FIRST_PAGE`]; a drop on page 1 is a
    /// caller sequencing bug, so clamp and warn instead of corrupting state.
    pub fn drop_page(&mut self) {
        if self.page > FIRST_PAGE {
            self.page -= 1;
        } else {
            warn!(page = self.page, "drop requested on first page - counter clamped");
        }
    }

    /// Clear all invariant data and images (new-project transition).
    pub fn clear(&mut self) {
        self.technician.clear();
        self.project.clear();
        self.part_number.clear();
        self.serial_number.clear();
        self.date.clear();
        self.images.clear();
        self.reset_page();
    }

    /// Snapshot of the invariant fields surfaced to the report layer on
    /// repeat/more actions.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            technician: self.technician.clone(),
            project: self.project.clone(),
            inspected_part: self.part_number.clone(),
            serial_number: self.serial_number.clone(),
            date: self.date.clone(),
            image_slots: self
                .images
                .filled()
                .into_iter()
                .map(|slot| slot.key().to_string())
                .collect(),
        }
    }
}

/// Invariant report fields under their wire/report keys.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub technician: String,
    pub project: String,
    #[serde(rename = "inspected-part")]
    pub inspected_part: String,
    #[serde(rename = "serial-number")]
    pub serial_number: String,
    pub date: String,
    /// Keys of the image slots that hold a captured photo
    #[serde(rename = "image-slots")]
    pub image_slots: Vec<String>,
}

// ============================================================================
// Defect Selection
// ============================================================================

/// Transient selection rebuilt on every pass through the Selection state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefectSelection {
    pub defect_type: String,
    pub surface_quality: String,
    pub finish: String,
    /// Acceptance criteria resolved from the catalog; `None` when the
    /// triple has no (unambiguous) documented criteria
    pub criteria: Option<String>,
}
