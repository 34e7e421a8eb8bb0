//! Step loop orchestration
//!
//! One step reads a batch from every camera, runs each camera's detector in
//! parallel, and hands the pooled detections to the tracking controller. The
//! loop stops when the shortest source is exhausted or the cancel flag is set;
//! either way every accumulated track proceeds to feature extraction.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dataset_export::{DatasetWriter, ExportError, Manifest};
use feature_engine::{AbstractVehicle, FeatureExtractionError, FourierFeatureBuilder};
use frame_source::{BatchSynchronizer, CameraAngle, CameraFrame, FrameSource, ImageSequenceSource};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use tracking::{StepDetections, TrackSet, TrackingController};
use vehicle_detector::{Detection, Detector, DetectorFactory};

use crate::{ConfigurationError, PipelineConfig, PipelineError};

/// Counters of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Steps executed
    pub steps: usize,
    /// Steps the synchronizer could have produced
    pub planned_steps: usize,
    /// Loop ended by the cancel flag
    pub cancelled: bool,
    /// Detections handed to the tracker
    pub detections: usize,
    /// Detections outside their camera's frame
    pub detections_out_of_frame: usize,
    /// Camera frames that could not be read
    pub capture_failures: usize,
    /// Detector calls that failed
    pub detection_failures: usize,
    /// Steps rejected by the tracker
    pub tracking_errors: usize,
    pub tracks_created: usize,
    pub tracks_lost: usize,
    /// Feature records built
    pub vehicles_built: usize,
    /// Records written to disk
    pub vehicles_exported: usize,
    /// Vehicles left out because their features or record failed
    pub vehicles_excluded: usize,
}

/// Result of the step loop and feature extraction
pub struct PipelineRun {
    /// Every track, in id order
    pub tracks: TrackSet,
    /// Labeled feature records, in id order
    pub vehicles: Vec<AbstractVehicle>,
    /// Tracks whose features could not be built
    pub failed: Vec<(u64, FeatureExtractionError)>,
    pub report: RunReport,
}

enum CameraOutcome {
    /// In-frame detections and the number dropped as out of frame
    Detected(Vec<Detection>, usize),
    CaptureFailed,
    DetectionFailed,
}

/// Drives the step loop
pub struct Orchestrator {
    synchronizer: BatchSynchronizer,
    /// One detector per camera, in source order
    detectors: Vec<Box<dyn Detector>>,
    controller: TrackingController,
    features: FourierFeatureBuilder,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    /// Assemble an orchestrator from its parts
    pub fn new(
        synchronizer: BatchSynchronizer,
        detectors: Vec<Box<dyn Detector>>,
        controller: TrackingController,
        features: FourierFeatureBuilder,
        cancel: Arc<AtomicBool>,
    ) -> Result<Self, ConfigurationError> {
        if detectors.len() != synchronizer.camera_count() {
            return Err(ConfigurationError::Invalid(format!(
                "{} detectors for {} cameras",
                detectors.len(),
                synchronizer.camera_count()
            )));
        }

        Ok(Self {
            synchronizer,
            detectors,
            controller,
            features,
            cancel,
        })
    }

    /// Open one image-sequence source per path and build every component
    /// from configuration
    pub fn from_config(
        config: &PipelineConfig,
        paths: &[impl AsRef<Path>],
        cancel: Arc<AtomicBool>,
    ) -> Result<Self, PipelineError> {
        config.validate(paths.len())?;

        let mut sources: Vec<(CameraAngle, Box<dyn FrameSource>)> = Vec::with_capacity(paths.len());
        for (angle, path) in config.capture.camera_angles().into_iter().zip(paths) {
            let source = ImageSequenceSource::open(path, &config.capture.extensions)?;
            sources.push((angle, Box::new(source) as Box<dyn FrameSource>));
        }
        let synchronizer = BatchSynchronizer::new(sources, config.capture.step)?;

        let factory = DetectorFactory::new(config.detector.clone())?;
        let detectors = (0..synchronizer.camera_count()).map(|_| factory.create()).collect();

        let controller = TrackingController::new(config.tracking.clone())?;
        let features = FourierFeatureBuilder::new(&config.features)?;

        Ok(Self::new(synchronizer, detectors, controller, features, cancel)?)
    }

    /// Run the step loop, finalize tracks and build labeled feature records
    pub fn run(mut self, maneuver: &str) -> PipelineRun {
        let mut report = RunReport {
            planned_steps: self.synchronizer.total_steps(),
            ..Default::default()
        };

        info!(
            "Starting step loop: {} cameras, {} steps of {} frames",
            self.synchronizer.camera_count(),
            report.planned_steps,
            self.synchronizer.step()
        );

        loop {
            if self.cancel.load(Ordering::SeqCst) {
                warn!("Step loop cancelled after {} steps", report.steps);
                report.cancelled = true;
                break;
            }
            let Some(batch) = self.synchronizer.next_batch() else {
                break;
            };

            let outcomes: Vec<CameraOutcome> = batch
                .frames
                .par_iter()
                .zip(self.detectors.par_iter_mut())
                .map(|(camera, detector)| detect_camera(camera, detector.as_mut()))
                .collect();

            let mut detections = Vec::new();
            for outcome in outcomes {
                match outcome {
                    CameraOutcome::Detected(found, out_of_frame) => {
                        detections.extend(found);
                        report.detections_out_of_frame += out_of_frame;
                    }
                    CameraOutcome::CaptureFailed => report.capture_failures += 1,
                    CameraOutcome::DetectionFailed => report.detection_failures += 1,
                }
            }
            report.detections += detections.len();

            debug!(
                "Step {} (frame {}): {} detections",
                batch.step_index,
                batch.frame_index,
                detections.len()
            );

            if let Err(e) = self
                .controller
                .receiver(&StepDetections::new(batch.frame_index, detections))
            {
                warn!("Step {} rejected by tracker: {}", batch.step_index, e);
                report.tracking_errors += 1;
            }
            report.steps += 1;
        }

        let stats = self.controller.stats();
        report.tracks_created = stats.tracks_created;
        report.tracks_lost = stats.tracks_lost;

        let tracks = self.controller.finalize();
        let (vehicles, failed) = build_features(&self.features, &tracks, maneuver);
        report.vehicles_built = vehicles.len();

        info!(
            "Run finished: {} steps, {} tracks, {} feature records, {} failed",
            report.steps,
            tracks.len(),
            vehicles.len(),
            failed.len()
        );

        PipelineRun {
            tracks,
            vehicles,
            failed,
            report,
        }
    }
}

fn detect_camera(camera: &CameraFrame, detector: &mut dyn Detector) -> CameraOutcome {
    let Some(frame) = &camera.frame else {
        return if camera.error.is_some() {
            CameraOutcome::CaptureFailed
        } else {
            CameraOutcome::Detected(Vec::new(), 0)
        };
    };

    match detector.detect(frame, camera.angle) {
        Ok(found) => {
            let total = found.len();
            let (width, height) = (frame.width as f64, frame.height as f64);
            let kept: Vec<Detection> = found
                .into_iter()
                .filter(|d| (0.0..=width).contains(&d.x) && (0.0..=height).contains(&d.y))
                .collect();
            let out_of_frame = total - kept.len();
            if out_of_frame > 0 {
                debug!(
                    "Camera {} frame {}: dropped {} detections outside {}x{}",
                    camera.angle, frame.frame_index, out_of_frame, frame.width, frame.height
                );
            }
            CameraOutcome::Detected(kept, out_of_frame)
        }
        Err(e) => {
            warn!("Camera {} frame {}: {}", camera.angle, frame.frame_index, e);
            CameraOutcome::DetectionFailed
        }
    }
}

/// Build and label one record per track in parallel, keeping id order
fn build_features(
    builder: &FourierFeatureBuilder,
    tracks: &TrackSet,
    maneuver: &str,
) -> (Vec<AbstractVehicle>, Vec<(u64, FeatureExtractionError)>) {
    let results: Vec<Result<AbstractVehicle, FeatureExtractionError>> = tracks
        .as_slice()
        .par_iter()
        .map(|track| builder.build(track.id(), &track.xs(), &track.ys()))
        .collect();

    let mut vehicles = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    for (track, result) in tracks.iter().zip(results) {
        match result {
            Ok(vehicle) => vehicles.push(vehicle.with_label(maneuver)),
            Err(e) => {
                warn!("Track {} excluded: {}", track.id(), e);
                failed.push((track.id(), e));
            }
        }
    }
    (vehicles, failed)
}

impl PipelineRun {
    /// Write every feature record and the manifest. A record that fails to
    /// write is listed as excluded; only a manifest failure is returned.
    pub fn export(&mut self, mut writer: DatasetWriter) -> Result<Manifest, ExportError> {
        for (id, error) in &self.failed {
            writer.record_excluded(*id, error.to_string());
        }

        for vehicle in &self.vehicles {
            let (xs, ys) = self
                .tracks
                .iter()
                .find(|t| t.id() == vehicle.id())
                .map(|t| (t.xs(), t.ys()))
                .unwrap_or_default();

            if let Err(e) = writer.write_vehicle(vehicle, &xs, &ys) {
                writer.record_excluded(vehicle.id(), e.to_string());
            }
        }

        let manifest = writer.finish()?;
        self.report.vehicles_exported = manifest.vehicles.len();
        self.report.vehicles_excluded = manifest.excluded.len();
        Ok(manifest)
    }
}
