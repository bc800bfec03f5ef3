//! Turns pixel-space polylines digitized over glacier radargrams into
//! georeferenced, physically scaled point data.
//!
//! The pipeline, leaf first:
//!
//! - [chord_sample] resamples a survey track at a fixed straight-line
//!   spacing, aware of breaks in the track.
//! - [PhysicalModels] maps pixel rows and columns of one radargram to
//!   depth, travel time, position and along-track distance.
//! - [read_interpretation] evaluates one user's submission at pixel
//!   columns.
//! - [Aligner] joins every user's latest submission with the models
//!   into [AlignedPoint]s, which [write_geojson] exports.

mod aligner;
mod crs;
mod error;
mod export;
mod kind;
pub mod math;
mod models;
pub mod parts;
mod reader;
mod submissions;
pub mod summary;

pub use crate::{
    aligner::{join, AlignedPoint, Aligner},
    crs::Crs,
    error::DigitizeError,
    export::{feature_collection, write_geojson},
    kind::Kind,
    math::{chord_sample, ChordParams, ChordSamples, Interp1d},
    models::{antenna_label, ModelBuilder, PhysicalModels},
    reader::{
        read_interpretation, sample_feature, Annotation, FeatureList, InterpretationRow,
        InterpretationTable, RawFeature, Submission,
    },
    submissions::{file_name, SubmissionStore, UserIndex},
    summary::Summary,
};
