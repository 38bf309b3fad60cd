//! Project-scoped criteria catalogs.
//!
//! A catalog is one CSV file per project holding the customer acceptance
//! criteria: one row per (defect, surface quality, finish) triple. Files are
//! discovered at runtime under a configured directory using the naming
//! convention `<project>_*` — the project identifier is everything before
//! the first underscore, upper-cased for display.
//!
//! Column positions are not trusted: the four roles (defect, quality,
//! finish, criteria) are resolved by configurable header keyword once at
//! load time, so reordered catalogs keep working.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Catalog loading and lookup errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no catalog file matches project '{0}'")]
    ProjectNotFound(String),

    #[error("catalog file '{0}' has no header row")]
    CatalogEmpty(String),

    #[error("failed to read catalog file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Header keywords that identify the four column roles.
#[derive(Debug, Clone)]
pub struct ColumnKeywords {
    pub defect: String,
    pub quality: String,
    pub finish: String,
    pub criteria: String,
}

impl Default for ColumnKeywords {
    fn default() -> Self {
        Self {
            defect: "Defect".to_string(),
            quality: "Surface Quality".to_string(),
            finish: "Finish".to_string(),
            criteria: "Criteria".to_string(),
        }
    }
}

/// Column indices resolved once per loaded catalog.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnRoles {
    defect: Option<usize>,
    quality: Option<usize>,
    finish: Option<usize>,
    criteria: Option<usize>,
}

impl ColumnRoles {
    fn resolve(headers: &[String], keywords: &ColumnKeywords) -> Self {
        let find = |keyword: &str| headers.iter().position(|h| h.trim() == keyword.trim());
        let roles = Self {
            defect: find(&keywords.defect),
            quality: find(&keywords.quality),
            finish: find(&keywords.finish),
            criteria: find(&keywords.criteria),
        };
        if roles.defect.is_none()
            || roles.quality.is_none()
            || roles.finish.is_none()
            || roles.criteria.is_none()
        {
            warn!(?headers, "catalog is missing one or more role columns");
        }
        roles
    }
}

// ============================================================================
// Project Discovery
// ============================================================================

/// Scan `dir` for catalog files and return the sorted, deduplicated,
/// upper-cased set of project identifiers.
///
/// A missing or empty directory yields an empty list, not an error — the
/// station can boot before any catalogs are provisioned.
pub fn discover_projects(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "catalog directory not readable");
            return Vec::new();
        }
    };

    let mut projects: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            // Project id is everything before the first separator.
            let (prefix, _) = name.split_once('_')?;
            let prefix = prefix.trim();
            if prefix.is_empty() {
                None
            } else {
                Some(prefix.to_uppercase())
            }
        })
        .collect();

    projects.sort();
    projects.dedup();
    projects
}

// ============================================================================
// Criteria Catalog
// ============================================================================

/// In-memory catalog for one project. Read-only after load; replaced
/// wholesale when the project changes.
#[derive(Debug, Clone)]
pub struct CriteriaCatalog {
    /// Upper-cased project identifier
    project: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    roles: ColumnRoles,
}

impl CriteriaCatalog {
    /// Load the catalog for `project` from `dir`.
    ///
    /// Locates files named `<project-lowercased>_*` and loads the first
    /// match (sorted by name, so provisioning a `..._v2` file next to the
    /// original does not change which one wins).
    pub fn load(dir: &Path, project: &str, keywords: &ColumnKeywords) -> Result<Self, CatalogError> {
        let wanted = project.trim().to_lowercase();
        if wanted.is_empty() {
            return Err(CatalogError::ProjectNotFound(project.to_string()));
        }

        let path = find_catalog_file(dir, &wanted)
            .ok_or_else(|| CatalogError::ProjectNotFound(wanted.clone()))?;

        let text = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let header_line = lines
            .next()
            .ok_or_else(|| CatalogError::CatalogEmpty(path.display().to_string()))?;

        let headers = csv_split(header_line);
        let rows: Vec<Vec<String>> = lines.map(csv_split).collect();
        let roles = ColumnRoles::resolve(&headers, keywords);

        debug!(
            project = %wanted,
            path = %path.display(),
            rows = rows.len(),
            "loaded criteria catalog"
        );

        Ok(Self {
            project: wanted.to_uppercase(),
            headers,
            rows,
            roles,
        })
    }

    /// Upper-cased project identifier this catalog was loaded for.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Catalog column headers, in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sorted distinct upper-cased defect types.
    pub fn defects(&self) -> Vec<String> {
        self.column_values(self.roles.defect)
    }

    /// Sorted distinct upper-cased surface quality buckets.
    pub fn quality(&self) -> Vec<String> {
        self.column_values(self.roles.quality)
    }

    /// Sorted distinct upper-cased finish categories.
    pub fn finish(&self) -> Vec<String> {
        self.column_values(self.roles.finish)
    }

    /// Resolve the acceptance criteria for a (defect, quality, finish)
    /// triple. Keys match case-insensitively with surrounding whitespace
    /// stripped.
    ///
    /// Strict single-match policy: zero matches means no documented
    /// criteria, and more than one match means the catalog is ambiguous —
    /// both yield `None` rather than guessing.
    pub fn criteria(&self, defect: &str, quality: &str, finish: &str) -> Option<String> {
        let defect_idx = self.roles.defect?;
        let quality_idx = self.roles.quality?;
        let finish_idx = self.roles.finish?;
        let criteria_idx = self.roles.criteria?;

        let key = |s: &str| s.trim().to_lowercase();
        let (defect, quality, finish) = (key(defect), key(quality), key(finish));

        let mut matches = self.rows.iter().filter(|row| {
            row.get(defect_idx).is_some_and(|c| key(c) == defect)
                && row.get(quality_idx).is_some_and(|c| key(c) == quality)
                && row.get(finish_idx).is_some_and(|c| key(c) == finish)
        });

        let first = matches.next()?;
        if matches.next().is_some() {
            warn!(
                project = %self.project,
                %defect, %quality, %finish,
                "ambiguous catalog: multiple rows match triple"
            );
            return None;
        }

        first.get(criteria_idx).map(|c| c.trim().to_string())
    }

    fn column_values(&self, index: Option<usize>) -> Vec<String> {
        let Some(index) = index else {
            return Vec::new();
        };
        let mut values: Vec<String> = self
            .rows
            .iter()
            .filter_map(|row| row.get(index))
            .map(|cell| cell.trim().to_uppercase())
            .filter(|cell| !cell.is_empty())
            .collect();
        values.sort();
        values.dedup();
        values
    }
}

/// Find the first (name-sorted) file under `dir` whose name starts with
/// `<project>_`, matched case-insensitively.
fn find_catalog_file(dir: &Path, project_lower: &str) -> Option<PathBuf> {
    let prefix = format!("{project_lower}_");
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().to_lowercase().starts_with(&prefix))
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

// ============================================================================
// CSV Quote-Aware Parsing
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
/// Returns owned strings because quoted fields need unquoting.
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Check for escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.clone());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}
