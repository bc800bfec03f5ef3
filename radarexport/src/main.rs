mod options;
mod progress;

use anyhow::{anyhow, Error as AnyError};
use clap::Parser;
use digitize::{chord_sample, summary, write_geojson, Aligner, ChordParams, Submission, SubmissionStore};
use log::info;
use options::{Align, Cli, Command as CliCmd, Export, Key, Submit, Summary};
use radargram::{Layout, Radargram};
use std::{
    fs::File,
    io::{BufWriter, Write},
};

fn main() -> Result<(), AnyError> {
    let Cli {
        data_dir,
        step,
        jump_threshold,
        tolerance,
        cmd,
    } = Cli::parse();
    env_logger::init();

    let layout = Layout::new(data_dir);
    let params = ChordParams::default()
        .step(step)
        .jump_threshold(jump_threshold)
        .tolerance(tolerance);
    match cmd {
        CliCmd::Resample(args) => resample(&layout, &params, args),
        CliCmd::Align(args) => align(layout, params, args),
        CliCmd::Export(args) => export(layout, params, args),
        CliCmd::Summary(args) => print_summary(&layout, args),
        CliCmd::Submit(args) => submit(layout, args),
    }
}

fn resample(layout: &Layout, params: &ChordParams, Key { key }: Key) -> Result<(), AnyError> {
    let radargram = Radargram::load(layout.processed_radar_path(&key))?;
    let grid = chord_sample(
        radargram.x(),
        radargram.easting(),
        radargram.northing(),
        params,
    )?;
    info!("{key}: {} samples from {} traces", grid.len(), radargram.width());

    let mut stdout = BufWriter::new(std::io::stdout().lock());
    writeln!(stdout, "x,part,distance")?;
    for point in grid.iter() {
        writeln!(stdout, "{},{},{}", point.x, point.part, point.distance)?;
    }
    stdout.flush()?;
    Ok(())
}

fn align(layout: Layout, params: ChordParams, Align { key, out }: Align) -> Result<(), AnyError> {
    let aligner = Aligner::new(SubmissionStore::new(layout)).params(params);
    let points = aligner.align(&key)?;
    info!("{key}: {} aligned points", points.len());

    match out {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(&path)?);
            write_geojson(&mut writer, &points)?;
            writer.flush()?;
        }
        None => {
            let mut stdout = BufWriter::new(std::io::stdout().lock());
            write_geojson(&mut stdout, &points)?;
            writeln!(stdout)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn export(layout: Layout, params: ChordParams, Export { out }: Export) -> Result<(), AnyError> {
    let aligner = Aligner::new(SubmissionStore::new(layout)).params(params);
    let keys = aligner.store().interpreted_radar_keys()?;
    let pb = progress::bar("Aligning radargrams".to_owned(), keys.len() as u64)?;
    let points = aligner.align_keys(&keys, || pb.inc(1));
    pb.finish();
    info!("{} radargrams, {} aligned points", keys.len(), points.len());

    let mut writer = BufWriter::new(File::create(&out)?);
    write_geojson(&mut writer, &points)?;
    writer.flush()?;
    Ok(())
}

fn print_summary(
    layout: &Layout,
    Summary {
        key,
        override_cache,
    }: Summary,
) -> Result<(), AnyError> {
    let summary = summary::load_or_compute(layout, &key, override_cache)?;
    let json = serde_json::to_string_pretty(&summary)?;
    println!("{json}");
    Ok(())
}

fn submit(layout: Layout, Submit { user, file }: Submit) -> Result<(), AnyError> {
    let submission = Submission::load(&file)?;
    let user = user
        .or_else(|| submission.user.clone())
        .ok_or_else(|| anyhow!("{file:?} names no user, pass --user"))?;
    let path = SubmissionStore::new(layout).write(&user, &submission)?;
    info!("stored {path:?}");
    Ok(())
}
