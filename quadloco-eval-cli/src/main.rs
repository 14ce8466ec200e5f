use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use quadloco::detect::{
    multi_sym_ring_peaks, quad_likeness, AzimCycle, DetectorParams, EdgeEval, PeakRCV, QuadWgt,
};
use quadloco::geom::Spot;
use quadloco::grid::ops::{gradient_grid_for, real_grid_of};
use quadloco::grid::Grid;
use quadloco::pgm::{read_meapoint, read_pgm, write_stretch_pgm};
use quadloco::stats::RunningStats;

/// Quad-target center evaluation over a directory of PGM chips.
///
/// Pairs every `<stem>.pgm` with its `<stem>.meapoint` expected-center
/// sidecar, runs the detection pipelines on each chip, and reports the
/// found/expected/difference centers.
#[derive(Parser)]
#[command(name = "quadloco-eval", version)]
struct Args {
    /// Directory holding the .pgm / .meapoint sample pairs
    load_dir: PathBuf,

    /// Optional directory for diagnostic raster dumps
    save_dir: Option<PathBuf>,

    /// Ring half sizes for the symmetry-ring detector
    #[arg(long, value_delimiter = ',', default_values_t = [5usize, 3usize])]
    ring_half_sizes: Vec<usize>,

    /// Azimuth-cycle evaluation radius in pixels
    #[arg(long, default_value = "7.0")]
    azim_radius: f64,

    /// Azimuth-cycle inner exclusion radius in pixels
    #[arg(long, default_value = "2.5")]
    azim_min_radius: f64,

    /// Emit one JSON record per sample instead of the plain report
    #[arg(long)]
    json: bool,

    /// Suppress per-sample progress on stderr
    #[arg(short, long)]
    quiet: bool,
}

/// One .pgm/.meapoint pair sharing a basename.
struct FileSet {
    stem: String,
    path_pgm: PathBuf,
    path_mea: PathBuf,
}

/// Evaluation results for one sample chip.
#[derive(Serialize)]
struct SampleResult {
    sample: String,
    expected_center: [f64; 2],
    sym_peak: Option<[f64; 2]>,
    sym_peak_value: Option<f64>,
    sym_miss: Option<f64>,
    edge_center: Option<[f64; 2]>,
    edge_center_sigma: Option<f64>,
    edge_miss: Option<f64>,
    azim_quad_like: bool,
    quad_likeness: Option<f64>,
}

/// Collect complete `.pgm` + `.meapoint` stem pairs from `load_dir`.
fn file_sets_from(load_dir: &Path) -> Result<Vec<FileSet>> {
    let mut pgms: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut meas: BTreeMap<String, PathBuf> = BTreeMap::new();

    let entries = std::fs::read_dir(load_dir)
        .with_context(|| format!("cannot read directory {}", load_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|e| e.to_str()),
        ) else {
            continue;
        };
        match ext {
            "pgm" => {
                pgms.insert(stem.to_string(), path.clone());
            }
            "meapoint" => {
                meas.insert(stem.to_string(), path.clone());
            }
            _ => {}
        }
    }

    let mut file_sets = Vec::new();
    for (stem, path_pgm) in pgms {
        if let Some(path_mea) = meas.get(&stem) {
            file_sets.push(FileSet {
                stem,
                path_pgm,
                path_mea: path_mea.clone(),
            });
        }
    }
    Ok(file_sets)
}

fn center_spot_of_peak(peak: &PeakRCV) -> Spot {
    Spot::new(peak.rc.row as f64 + 0.5, peak.rc.col as f64 + 0.5)
}

fn miss_of(got: Spot, exp: Spot) -> f64 {
    (got - exp).magnitude()
}

fn process_file_set(
    file_set: &FileSet,
    args: &Args,
    params: &DetectorParams,
) -> Result<SampleResult> {
    let pgm_grid = read_pgm(&file_set.path_pgm)
        .with_context(|| format!("reading {}", file_set.path_pgm.display()))?;
    let exp_center = read_meapoint(&file_set.path_mea)
        .with_context(|| format!("reading {}", file_set.path_mea.display()))?;

    let src_grid: Grid<f32> = real_grid_of(&pgm_grid);
    let src_stats = RunningStats::from_samples(src_grid.iter().map(|&v| v as f64));

    // symmetry-ring path
    let sym_peaks = multi_sym_ring_peaks(&src_grid, &src_stats, &args.ring_half_sizes);
    let best_peak = sym_peaks.first();

    // edge-signal path
    let grad_grid = gradient_grid_for(&src_grid, params.step_half);
    let edge_eval = EdgeEval::new(&grad_grid, params);
    let quad_wgts: Vec<QuadWgt> = edge_eval.sig_quad_weights(src_grid.hw());
    let best_quad = quad_wgts.first();

    // azimuth gate at the strongest available center estimate
    let gate_center = best_quad
        .map(|qw| qw.item.center)
        .or_else(|| best_peak.map(center_spot_of_peak));
    let azim_quad_like = gate_center
        .map(|center| {
            AzimCycle::new(&src_grid, center, args.azim_radius, args.azim_min_radius)
                .has_quad_transitions()
        })
        .unwrap_or(false);

    let likeness = best_quad.map(|qw| quad_likeness(&src_grid, &qw.item));

    if let Some(save_dir) = &args.save_dir {
        std::fs::create_dir_all(save_dir)
            .with_context(|| format!("creating {}", save_dir.display()))?;
        let dump = |name: &str, grid: &Grid<f32>| -> Result<()> {
            let path = save_dir.join(format!("{}_{name}.pgm", file_set.stem));
            write_stretch_pgm(&path, grid)
                .with_context(|| format!("writing {}", path.display()))
        };
        let mag_grid = Grid::from_vec(
            grad_grid.hw(),
            grad_grid.iter().map(|g| g.magnitude() as f32).collect(),
        );
        dump("gradmag", &mag_grid)?;
        dump("edgeinfo", &edge_eval.edge_info_grid(src_grid.hw()))?;
        let mut sym_grid = Grid::filled(src_grid.hw(), 1.0f32);
        for &half in &args.ring_half_sizes {
            let resp = quadloco::detect::sym_ring_grid_for(&src_grid, &src_stats, half);
            for (out, &val) in sym_grid.iter_mut().zip(resp.iter()) {
                *out *= val;
            }
        }
        dump("symring", &sym_grid)?;
    }

    Ok(SampleResult {
        sample: file_set.stem.clone(),
        expected_center: [exp_center.row, exp_center.col],
        sym_peak: best_peak.map(|p| {
            let spot = center_spot_of_peak(p);
            [spot.row, spot.col]
        }),
        sym_peak_value: best_peak.map(|p| p.value),
        sym_miss: best_peak.map(|p| miss_of(center_spot_of_peak(p), exp_center)),
        edge_center: best_quad.map(|qw| [qw.item.center.row, qw.item.center.col]),
        edge_center_sigma: best_quad
            .map(|qw| qw.item.center_sigma)
            .filter(|sigma| sigma.is_finite()),
        edge_miss: best_quad.map(|qw| miss_of(qw.item.center, exp_center)),
        azim_quad_like,
        quad_likeness: likeness.filter(|prob| prob.is_finite()),
    })
}

fn print_report(results: &[SampleResult]) {
    for result in results {
        println!("\n======= {}", result.sample);
        println!(
            "  exp center: ({:9.3}, {:9.3})",
            result.expected_center[0], result.expected_center[1]
        );
        match (result.sym_peak, result.sym_miss) {
            (Some(peak), Some(miss)) => println!(
                "  sym  peak : ({:9.3}, {:9.3})  miss: {:7.3}",
                peak[0], peak[1], miss
            ),
            _ => println!("  sym  peak : (none)"),
        }
        match (result.edge_center, result.edge_miss) {
            (Some(center), Some(miss)) => {
                println!(
                    "  edge center: ({:9.3}, {:9.3})  miss: {:7.3}  sigma: {:7.3}",
                    center[0],
                    center[1],
                    miss,
                    result.edge_center_sigma.unwrap_or(f64::NAN)
                );
            }
            _ => println!("  edge center: (none)"),
        }
        println!("  azim quad-like: {}", result.azim_quad_like);
        if let Some(likeness) = result.quad_likeness {
            println!("  quad likeness : {likeness:7.3}");
        }
    }
    println!();
}

fn run(args: &Args) -> Result<()> {
    let params = DetectorParams::default();
    let file_sets = file_sets_from(&args.load_dir)?;

    let mut results = Vec::with_capacity(file_sets.len());
    for file_set in &file_sets {
        if !args.quiet {
            eprintln!("processing {}", file_set.path_pgm.display());
        }
        results.push(process_file_set(file_set, args, &params)?);
    }

    if args.json {
        for result in &results {
            println!("{}", serde_json::to_string(result)?);
        }
    } else {
        print_report(&results);
        println!("loadDir: {}", args.load_dir.display());
        if let Some(save_dir) = &args.save_dir {
            println!("saveDir: {}", save_dir.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // usage problems exit with status 1
            let _ = err.print();
            return ExitCode::from(1);
        }
    };
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}
