use crate::annotations::plan_annotations;
use crate::config::{calculate_config_hash, ReconcileConfig};
use crate::layout::{FormulaDetector, ImageDetector};
use crate::matching::{match_in_order, ContentFilter, Matcher};
use crate::report::ReconciliationReport;
use crate::tree::{collect_tree_formulas, collect_tree_images};
use crate::types::DocumentPair;
use anyhow::{Context, Result};
use std::time::{Duration, Instant};

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        log::info!("{}: {}µs", step_name, elapsed.as_micros());

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("\n📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            println!(
                "   {:.<35} {:.3}ms ({:.1}%)",
                step,
                duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        println!("   {:.<35} {:.3}ms", "Total", total.as_secs_f64() * 1000.0);
    }
}

/// Runs formula and image detection, matching and annotation planning for one document
/// pair.
///
/// The content filter is compiled once here and reused for every run, so a single
/// reconciler can process many pairs (also from several threads: it holds no mutable
/// state).
pub struct Reconciler {
    config: ReconcileConfig,
    filter: ContentFilter,
    config_hash: String,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Result<Self> {
        let filter = ContentFilter::new(&config.content_filter)
            .context("Failed to compile content filter patterns")?;
        let config_hash = calculate_config_hash(&config)?;
        Ok(Self {
            config,
            filter,
            config_hash,
        })
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn reconcile(&self, pair: &DocumentPair) -> ReconciliationReport {
        self.reconcile_with_profiler(pair, &mut StepProfiler::new(false))
    }

    /// Same as `reconcile`, printing a timing summary when `enable_profiling` is set.
    pub fn reconcile_with_profiling(
        &self,
        pair: &DocumentPair,
        enable_profiling: bool,
    ) -> ReconciliationReport {
        let mut profiler = StepProfiler::new(enable_profiling);
        let report = self.reconcile_with_profiler(pair, &mut profiler);
        profiler.print_summary();
        report
    }

    fn reconcile_with_profiler(
        &self,
        pair: &DocumentPair,
        profiler: &mut StepProfiler,
    ) -> ReconciliationReport {
        let layout = profiler.time_step("1. Layout formula detection", || {
            FormulaDetector::new(&self.config).detect(&pair.pages)
        });

        let tree = profiler.time_step("2. Tree formula collection", || {
            collect_tree_formulas(&pair.paragraphs, &self.config.tree_detection)
        });

        let mapping = profiler.time_step("3. Matching", || {
            Matcher::new(&self.config.matching, &self.filter).match_entities(&layout, &tree)
        });

        let (layout_images, tree_images, image_mapping) =
            profiler.time_step("4. Image reconciliation", || {
                let layout_images = ImageDetector::new(&self.config).detect(&pair.pages);
                let tree_images = if self.config.images.enabled {
                    collect_tree_images(&pair.paragraphs, &self.config.tree_detection)
                } else {
                    Vec::new()
                };
                let image_mapping = match_in_order(&layout_images, &tree_images);
                (layout_images, tree_images, image_mapping)
            });

        let annotations = profiler.time_step("5. Annotation planning", || {
            let mut annotations = plan_annotations(&layout, &tree, &mapping);
            annotations.extend(plan_annotations(&layout_images, &tree_images, &image_mapping));
            annotations.sort_by_key(|a| a.paragraph_index);
            annotations
        });

        ReconciliationReport::new(self.config_hash.clone(), layout, tree, mapping, annotations)
            .with_images(layout_images, tree_images, image_mapping)
    }
}
