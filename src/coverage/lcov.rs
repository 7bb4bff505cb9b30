use std::collections::{BTreeMap, HashMap, hash_map::Entry};
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::core::traits::adapter::{AdapterError, CoverageData};

/// Line hits of one `SF:` record.
#[derive(Clone, Debug, Default, PartialEq)]
struct FileCoverage {
    hits: BTreeMap<u32, u64>,
    lines_found: Option<u64>,
    lines_hit: Option<u64>,
}

impl FileCoverage {
    fn found(&self) -> u64 {
        self.lines_found.unwrap_or(self.hits.len() as u64)
    }

    fn hit(&self) -> u64 {
        self.lines_hit
            .unwrap_or_else(|| self.hits.values().filter(|hits| **hits > 0).count() as u64)
    }

    /// Folds a later record for the same source file into this one.
    /// Summary counts no longer describe the union, so they are derived from `DA`.
    fn merge(&mut self, other: FileCoverage) {
        for (line, hits) in other.hits {
            let total = self.hits.entry(line).or_default();
            *total = total.saturating_add(hits);
        }
        if self.hits.is_empty() {
            self.lines_found = self.lines_found.max(other.lines_found);
            self.lines_hit = self.lines_hit.max(other.lines_hit);
        } else {
            self.lines_found = None;
            self.lines_hit = None;
        }
    }
}

/// Per-line coverage read from an LCOV tracefile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LcovCoverage {
    files: HashMap<PathBuf, FileCoverage>,
}

impl LcovCoverage {
    pub async fn load(path: &Path) -> Result<Self, AdapterError> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AdapterError::MissingCoverage { path: path.into() }
            } else {
                AdapterError::CoverageUnreadable {
                    path: path.into(),
                    source: e,
                }
            }
        })?;
        Self::parse(path, &content)
    }

    /// `path` is only used to label errors.
    pub fn parse(path: &Path, content: &str) -> Result<Self, AdapterError> {
        let malformed = |line: usize, reason: &str| AdapterError::MalformedCoverage {
            path: path.into(),
            line,
            reason: reason.to_string(),
        };

        let mut files: HashMap<PathBuf, FileCoverage> = HashMap::new();
        let mut current: Option<(PathBuf, FileCoverage)> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if line == "end_of_record" {
                let (file, coverage) = current
                    .take()
                    .ok_or_else(|| malformed(line_no, "end_of_record outside of a record"))?;
                match files.entry(file) {
                    Entry::Occupied(mut existing) => existing.get_mut().merge(coverage),
                    Entry::Vacant(slot) => {
                        slot.insert(coverage);
                    }
                }
                continue;
            }

            let Some((tag, value)) = line.split_once(':') else {
                return Err(malformed(line_no, "expected `TAG:VALUE`"));
            };

            match tag {
                "SF" => {
                    if current.is_some() {
                        return Err(malformed(line_no, "SF before end_of_record"));
                    }
                    current = Some((PathBuf::from(value), FileCoverage::default()));
                }
                "DA" | "LF" | "LH" => {
                    let Some((_, coverage)) = current.as_mut() else {
                        return Err(malformed(line_no, &format!("{} outside of a record", tag)));
                    };
                    match tag {
                        "DA" => {
                            let mut fields = value.split(',');
                            let line = fields.next().and_then(|f| f.parse::<u32>().ok());
                            let hits = fields.next().and_then(|f| f.parse::<u64>().ok());
                            let (Some(line), Some(hits)) = (line, hits) else {
                                return Err(malformed(line_no, "expected `DA:<line>,<hits>`"));
                            };
                            let total = coverage.hits.entry(line).or_default();
                            *total = total.saturating_add(hits);
                        }
                        "LF" => {
                            let found = value
                                .parse()
                                .map_err(|_| malformed(line_no, "LF is not a number"))?;
                            coverage.lines_found = Some(found);
                        }
                        _ => {
                            let hit = value
                                .parse()
                                .map_err(|_| malformed(line_no, "LH is not a number"))?;
                            coverage.lines_hit = Some(hit);
                        }
                    }
                }
                // TN, FN, FNDA, BRDA and friends carry nothing line coverage needs.
                _ => {}
            }
        }

        if current.is_some() {
            return Err(malformed(content.lines().count(), "missing end_of_record"));
        }

        Ok(LcovCoverage { files })
    }

    /// Percentage of instrumented lines executed at least once.
    pub fn line_percentage(&self) -> f64 {
        let (found, hit) = self
            .files
            .values()
            .fold((0u64, 0u64), |(found, hit), file| {
                (found + file.found(), hit + file.hit())
            });

        if found == 0 {
            0.0
        } else {
            hit as f64 * 100.0 / found as f64
        }
    }
}

#[async_trait::async_trait]
impl CoverageData for LcovCoverage {
    async fn line_coverage_from(&self, log_file: &Path) -> Result<f64, AdapterError> {
        Ok(LcovCoverage::load(log_file).await?.line_percentage())
    }

    fn is_line_covered(&self, file: &Path, line: u32) -> bool {
        self.files
            .get(file)
            .and_then(|coverage| coverage.hits.get(&line))
            .is_some_and(|hits| *hits > 0)
    }
}
