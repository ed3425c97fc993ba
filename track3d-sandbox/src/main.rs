mod settings;

use log::*;
use serde::de::DeserializeOwned;
use settings::SandboxSettings;
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use structopt::StructOpt;
use track3d::{
    associate::Associator,
    geom::{look_at, Projector},
    nalgebra::Point3,
    optimize::{calibrate_tracks, Calibration},
    CalibrationSettings, CameraParams, CameraSlot, CameraSummary, CameraSystem, CameraSystemRecord, MatchRecord,
    RigConfig, RigConfigRecord, Track, TrackRecord,
};

#[derive(StructOpt, Clone)]
#[structopt(
    name = "track3d-sandbox",
    about = "A tool for reconstructing 3d tracks seen by two cameras"
)]
struct Opt {
    /// The fixed configuration of both cameras.
    ///
    /// This is a JSON object with the keys `k1`, `k2`, `r1`, `r2`, `c1` and `c2`.
    #[structopt(long, parse(from_os_str))]
    rig: PathBuf,
    /// The tracks of the first camera, as a JSON array of tracks.
    #[structopt(long, parse(from_os_str))]
    first: PathBuf,
    /// The tracks of the second camera, as a JSON array of tracks.
    #[structopt(long, parse(from_os_str))]
    second: PathBuf,
    /// The indices of the reference tracks in the first and in the second camera.
    ///
    /// Both must be the same subject moving on the reference plane. Defaults to `0 0`.
    #[structopt(long, number_of_values = 2)]
    reference: Vec<usize>,
    /// A spot both cameras are roughly aimed at, used for the initial orientation guess.
    ///
    /// When absent both cameras start looking straight down.
    #[structopt(long, number_of_values = 3, allow_hyphen_values = true)]
    look_at: Option<Vec<f64>>,
    /// The file where settings are specified.
    ///
    /// Missing keys, or a missing file, fall back to the defaults.
    #[structopt(short, long, default_value = "track3d-settings.json")]
    settings: PathBuf,
    /// The file where the calibrated camera system is stored.
    ///
    /// If this file exists, calibration is skipped and the system is loaded from it.
    /// Otherwise the cameras are calibrated and the result is saved there.
    #[structopt(long, default_value = "track3d-system.json")]
    system: PathBuf,
    /// Stop the calibration after this many seconds.
    #[structopt(long)]
    deadline_secs: Option<u64>,
    /// Output JSON file for the reconstructed paths. Defaults to stdout.
    #[structopt(short, long)]
    output: Option<PathBuf>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let value =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(value)
}

fn read_tracks(path: &Path) -> Result<Vec<Track>, Box<dyn Error>> {
    let records: Vec<TrackRecord> = read_json(path)?;
    let tracks = records
        .into_iter()
        .map(Track::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    info!("loaded {} tracks from {}", tracks.len(), path.display());
    Ok(tracks)
}

/// Aims both cameras at `target` and takes the shared heading from the reference track as the
/// first camera sees it.
fn initial_guess(
    config: RigConfig,
    target: Point3<f64>,
    reference: &Track,
    z0: f64,
) -> Result<CameraSystem, Box<dyn Error>> {
    let first = look_at(config.first.position, target);
    let second = look_at(config.second.position, target);
    let projector = Projector::new(first, config.first);
    let samples = reference.samples();
    let heading = match (samples.first(), samples.last()) {
        (Some(&start), Some(&end)) => {
            let displacement =
                projector.project_to_plane(end, z0)? - projector.project_to_plane(start, z0)?;
            displacement.y.atan2(displacement.x)
        }
        _ => 0.0,
    };
    Ok(CameraSystem::new(config).with_params(CameraParams::new(
        first.theta,
        second.theta,
        heading,
        first.phi,
        second.phi,
    )))
}

/// Calibrates on track `i` of the first camera and track `j` of the second camera.
///
/// Errors name the reference pair.
fn calibrate_reference(
    guess: &CameraSystem,
    (i, first): (usize, &Track),
    (j, second): (usize, &Track),
    settings: CalibrationSettings,
    deadline: Option<Instant>,
) -> track3d::Result<Calibration> {
    calibrate_tracks(guess, first, second, settings, deadline).map_err(|e| e.for_pair(i, j))
}

fn log_system(system: &CameraSystem, z0: f64) {
    for slot in CameraSlot::BOTH {
        let summary = CameraSummary::new(system, slot);
        info!(
            "{:?} camera: position {:?}, rotation {:?} degrees, fov {:.2}x{:.2} degrees, aspect {:.4}",
            slot,
            summary.position.as_slice(),
            summary.rotation_degrees.as_slice(),
            summary.horizontal_fov_degrees,
            summary.vertical_fov_degrees,
            summary.aspect_ratio
        );
        match Projector::from_system(system, slot).footprint(z0) {
            Ok(corners) => info!(
                "{:?} camera footprint: {:?}",
                slot,
                corners
                    .iter()
                    .map(|p| [p.x, p.y])
                    .collect::<Vec<_>>()
            ),
            Err(e) => warn!("{:?} camera footprint unavailable: {}", slot, e),
        }
    }
}

fn run(opt: Opt) -> Result<(), Box<dyn Error>> {
    let settings = File::open(&opt.settings)
        .ok()
        .and_then(|file| serde_json::from_reader(BufReader::new(file)).ok());
    if settings.is_some() {
        info!("loaded existing settings");
    } else {
        info!("used default settings");
    }
    let settings: SandboxSettings = settings.unwrap_or_default();

    let first = read_tracks(&opt.first)?;
    let second = read_tracks(&opt.second)?;

    info!("trying to load an existing camera system");
    let stored = File::open(&opt.system)
        .ok()
        .map(|file| serde_json::from_reader::<_, CameraSystemRecord>(BufReader::new(file)));
    let (system, calibration_settings) = match stored {
        Some(record) => {
            // A file that exists but can not be read is an error, never a reason to recalibrate.
            let (system, stored_settings) = record?.into_parts()?;
            info!("loaded calibrated system from {}", opt.system.display());
            (system, stored_settings.unwrap_or(settings.calibration))
        }
        None => {
            let config = RigConfig::try_from(read_json::<RigConfigRecord>(&opt.rig)?)?;
            let (i, j) = match opt.reference[..] {
                [] => (0, 0),
                [i, j] => (i, j),
                _ => return Err("expected two reference indices".into()),
            };
            let reference_first = first
                .get(i)
                .ok_or_else(|| format!("no track {} in the first camera", i))?;
            let reference_second = second
                .get(j)
                .ok_or_else(|| format!("no track {} in the second camera", j))?;
            let guess = match opt.look_at.as_deref() {
                Some(&[x, y, z]) => initial_guess(
                    config,
                    Point3::new(x, y, z),
                    reference_first,
                    settings.calibration.z0,
                )?,
                _ => CameraSystem::new(config),
            };
            let deadline = opt
                .deadline_secs
                .map(|secs| Instant::now() + Duration::from_secs(secs));
            let calibration = calibrate_reference(
                &guess,
                (i, reference_first),
                (j, reference_second),
                settings.calibration,
                deadline,
            )?;
            if calibration.interrupted {
                warn!("saving a calibration cut short by the deadline");
            }
            info!("saving the calibrated system to {}", opt.system.display());
            let record = CameraSystemRecord::new(&calibration.system, Some(calibration.settings));
            serde_json::to_writer_pretty(BufWriter::new(File::create(&opt.system)?), &record)?;
            (calibration.system, calibration.settings)
        }
    };
    log_system(&system, calibration_settings.z0);

    let matches = Associator::new(&system, &calibration_settings, settings.association)
        .associate(&first, &second)?;
    for result in &matches {
        info!(
            "track {} and track {} over frames {} with loss {:.4}",
            result.i, result.j, result.span, result.loss
        );
    }
    let records: Vec<MatchRecord> = matches.iter().map(MatchRecord::from).collect();
    match opt.output {
        Some(path) => {
            info!("writing {} matches to {}", records.len(), path.display());
            serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &records)?;
        }
        None => println!("{}", serde_json::to_string_pretty(&records)?),
    }
    Ok(())
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();
    if let Err(e) = run(opt) {
        error!("{}", e);
        std::process::exit(1);
    }
}
