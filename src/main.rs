use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Instant;

use clap::Parser;
use itertools::{iproduct, Itertools};
use nannou::color::Rgb;
use nannou::prelude::*;

use voxel_erosion::erosion::reference_center;
use voxel_erosion::util::{gradient_rgb, map_clamp, minmax};
use voxel_erosion::{
    erosion_map, mass_curve, ErosionRate, MassSummary, SimulationConfig, TimeIntegrator, VoxelGrid,
};

const SIZE_X: u32 = 800;
const SIZE_Y: u32 = 800;

/// Number of frames each snapshot stays on screen.
const FRAME_HOLD: u64 = 4;

/// Length of the flow arrow, in voxels.
const FLOW_ARROW_LENGTH: f32 = 10.0;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Erode a voxelized body under a directional flow")]
struct Args {
    /// Path to the YAML simulation config.
    #[arg(default_value = "parameters.yaml")]
    config: PathBuf,

    /// Run the simulation without a window and log the results.
    #[arg(long)]
    headless: bool,
}

/// The config and the simulated run, prepared before the window opens.
static STARTUP: OnceLock<(SimulationConfig, TimeIntegrator)> = OnceLock::new();

struct Model {
    config: SimulationConfig,
    sim: TimeIntegrator,
    /// The snapshot currently on screen.
    frame: usize,
    mode: DrawingMode,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = SimulationConfig::from_file(&args.config)?;

    log::info!("loaded {} from {}", config.label(), args.config.display());
    log::info!("{:#?}", config);

    if args.headless {
        return run_headless(&config);
    }

    let sim = simulate(&config)?;
    let _ = STARTUP.set((config, sim));

    nannou::app(model).update(update).run();

    Ok(())
}

fn run_headless(config: &SimulationConfig) -> anyhow::Result<()> {
    let mut sim = config.build_integrator()?;

    let run = &config.simulation;
    sim.run(run.log_interval, false, config.erosion_model.water_source_height)?;

    match MassSummary::from_history(sim.history()) {
        Some(summary) => log::info!("{:#?}", summary),
        None => log::info!("no summary stats available"),
    }

    if let Some((min, max)) = minmax(sim.state().values()) {
        log::info!("final grid values within [{}, {}]", min, max);
    }

    Ok(())
}

fn model(app: &App) -> Model {
    let (config, sim) = STARTUP.get().cloned().expect("run is prepared before the app starts");

    app.new_window()
        .size(SIZE_X, SIZE_Y)
        .title(config.label())
        .view(view)
        .mouse_released(mouse_released)
        .build()
        .unwrap();

    Model {
        config,
        sim,
        frame: 0,
        mode: DrawingMode::Projection,
    }
}

/// Run the whole simulation up front, keeping a snapshot of every step for playback.
///
/// A run that fails partway is kept, with the steps completed so far.
fn simulate(config: &SimulationConfig) -> voxel_erosion::Result<TimeIntegrator> {
    let now = Instant::now();

    let mut sim = config.build_integrator()?;

    let height = config.erosion_model.water_source_height;

    if let Err(e) = sim.run(config.simulation.log_interval, true, height) {
        log::error!("simulation stopped after {} steps: {}", sim.history().len(), e);
    }

    log::info!(
        "simulated {} steps in {:.4?}",
        sim.history().len(),
        now.elapsed()
    );

    Ok(sim)
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum DrawingMode {
    Projection,
    FlowDebug,
    Slice,
    ErosionMap,
    MassHistory,
}

fn cycle_drawing_mode(mode: DrawingMode) -> DrawingMode {
    match mode {
        DrawingMode::Projection => DrawingMode::FlowDebug,
        DrawingMode::FlowDebug => DrawingMode::Slice,
        DrawingMode::Slice => DrawingMode::ErosionMap,
        DrawingMode::ErosionMap => DrawingMode::MassHistory,
        DrawingMode::MassHistory => DrawingMode::Projection,
    }
}

fn update(app: &App, model: &mut Model, _update: Update) {
    let count = model.sim.snapshots().len();

    if count > 0 && app.elapsed_frames() % FRAME_HOLD == 0 {
        model.frame = (model.frame + 1) % count;
    }
}

fn mouse_released(_: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Left {
        model.config.erosion_model.seed = Some(random());

        match simulate(&model.config) {
            Ok(sim) => {
                model.sim = sim;
                model.frame = 0;
            }
            Err(e) => log::error!("failed to rerun simulation: {}", e),
        }
    }

    if button == MouseButton::Right {
        model.mode = cycle_drawing_mode(model.mode);
    }
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();

    draw.background().color(SNOW);

    if let Some(grid) = model.sim.snapshots().get(model.frame) {
        let bounds = app.window_rect().pad(40.0);

        match model.mode {
            DrawingMode::Projection => {
                draw_projection(&draw, bounds, grid);
            }
            DrawingMode::FlowDebug => {
                let flow = model.sim.model().flow();
                let height = model.config.erosion_model.water_source_height;
                draw_flow_debug(&draw, bounds, grid, flow, height);
            }
            DrawingMode::Slice => {
                draw_slice(&draw, bounds, grid);
            }
            DrawingMode::ErosionMap => {
                draw_erosion_map(&draw, bounds, &model.sim.snapshots()[0], grid);
            }
            DrawingMode::MassHistory => {
                let initial = model.sim.snapshots()[0].total_mass(1.0);
                let curve = mass_curve(initial, model.sim.history());
                draw_mass_history(&draw, bounds, &curve, model.frame);
            }
        }

        let caption = format!("{:?} | step {}", model.mode, model.frame);
        draw.text(&caption)
            .x_y(0.0, bounds.top() + 20.0)
            .w(bounds.w())
            .color(BLACK);
    }

    draw.to_frame(app, &frame).unwrap();
}

/// Isometric view of grid coordinates, fitted to a region of the window.
struct Isometric {
    /// Middle of the projected points.
    middle: Vec2,
    center: Vec2,
    scale: f32,
}

impl Isometric {
    /// Fit the projections of all the given points into the bounds.
    fn fit(bounds: Rect, points: &[Vec3]) -> Self {
        let projected = points.iter().map(|p| isometric(*p)).collect_vec();

        let xs = projected.iter().map(|p| p.x).collect_vec();
        let ys = projected.iter().map(|p| p.y).collect_vec();

        let (Some((left, right)), Some((bottom, top))) = (minmax(&xs), minmax(&ys)) else {
            return Self {
                middle: Vec2::ZERO,
                center: bounds.xy(),
                scale: 1.0,
            };
        };

        let scale = (bounds.w() / (right - left).max(1.0)).min(bounds.h() / (top - bottom).max(1.0));

        Self {
            middle: pt2(left + right, bottom + top) * 0.5,
            center: bounds.xy(),
            scale,
        }
    }

    fn project(&self, p: Vec3) -> Vec2 {
        (isometric(p) - self.middle) * self.scale + self.center
    }
}

fn isometric(p: Vec3) -> Vec2 {
    let (sin, cos) = (PI / 6.0).sin_cos();
    pt2((p.x - p.y) * cos, p.z - (p.x + p.y) * sin)
}

fn grid_corners(grid: &VoxelGrid) -> Vec<Vec3> {
    let (nx, ny, nz) = grid.dimensions();

    iproduct!([0, nx], [0, ny], [0, nz])
        .map(|(x, y, z)| vec3(x as f32, y as f32, z as f32))
        .collect()
}

/// Draw every remaining voxel as a point in an isometric projection.
fn draw_projection(draw: &Draw, bounds: Rect, grid: &VoxelGrid) {
    let iso = Isometric::fit(bounds, &grid_corners(grid));
    draw_voxels(draw, &iso, grid, |v| gradient_rgb(colorous::VIRIDIS, v));
}

/// Draw the body, the virtual flow source with an arrow along the flow, and the plane through the
/// middle of the grid.
fn draw_flow_debug(draw: &Draw, bounds: Rect, grid: &VoxelGrid, flow: Vec3, source_height: f32) {
    let (nx, ny, nz) = grid.dimensions();

    let source = reference_center(grid, flow, source_height);
    let tip = source + flow * FLOW_ARROW_LENGTH;

    let mut points = grid_corners(grid);
    points.extend([source, tip]);

    let iso = Isometric::fit(bounds, &points);

    let (nx, ny, mid) = (nx as f32, ny as f32, nz as f32 * 0.5);
    let plane = [
        vec3(0.0, 0.0, mid),
        vec3(nx, 0.0, mid),
        vec3(nx, ny, mid),
        vec3(0.0, ny, mid),
    ];

    draw.polygon()
        .color(rgba(0.0, 0.6, 0.0, 0.3))
        .points(plane.iter().map(|p| iso.project(*p)));

    draw_voxels(draw, &iso, grid, |_| LIGHTBLUE);

    draw.arrow()
        .start(iso.project(source))
        .end(iso.project(tip))
        .weight(3.0)
        .color(RED);

    draw.ellipse()
        .xy(iso.project(source))
        .radius(iso.scale.max(4.0))
        .color(ORANGE);
}

/// Draw the voxels of the grid back to front.
fn draw_voxels<F>(draw: &Draw, iso: &Isometric, grid: &VoxelGrid, color: F)
where
    F: Fn(f32) -> Rgb<u8>,
{
    for (x, y, z) in grid.indices().sorted_by_key(|(x, y, z)| x + y + z) {
        let v = grid.get((x, y, z)).unwrap_or(0.0);

        if v <= 0.0 {
            continue;
        }

        draw.ellipse()
            .xy(iso.project(vec3(x as f32, y as f32, z as f32)))
            .radius(iso.scale * 0.45)
            .color(color(v));
    }
}

/// Draw the x-z section through the middle of the grid.
fn draw_slice(draw: &Draw, bounds: Rect, grid: &VoxelGrid) {
    let (nx, ny, nz) = grid.dimensions();
    let y = ny / 2;

    let cell = (bounds.w() / nx as f32).min(bounds.h() / nz as f32);

    for x in 0..nx {
        for z in 0..nz {
            let v = grid.get((x, y, z)).unwrap_or(0.0);

            let px = (x as f32 - nx as f32 * 0.5 + 0.5) * cell;
            let pz = (z as f32 - nz as f32 * 0.5 + 0.5) * cell;

            draw.rect()
                .x_y(px, pz)
                .w_h(cell, cell)
                .color(gradient_rgb(colorous::VIRIDIS, v));
        }
    }
}

/// Draw the material lost in each x-y column since the first snapshot.
fn draw_erosion_map(draw: &Draw, bounds: Rect, first: &VoxelGrid, current: &VoxelGrid) {
    let (nx, ny, nz) = current.dimensions();

    let erosion = match erosion_map(first, current) {
        Ok(erosion) => erosion,
        Err(_) => return,
    };

    let cell = (bounds.w() / nx as f32).min(bounds.h() / ny as f32);

    for (x, y) in (0..nx).cartesian_product(0..ny) {
        let column = &erosion[(x * ny + y) * nz..(x * ny + y + 1) * nz];
        let loss: f32 = column.iter().sum();

        let px = (x as f32 - nx as f32 * 0.5 + 0.5) * cell;
        let py = (y as f32 - ny as f32 * 0.5 + 0.5) * cell;

        draw.rect()
            .x_y(px, py)
            .w_h(cell, cell)
            .color(gradient_rgb(colorous::MAGMA, map_clamp(loss, 0.0, 1.0, 0.0, 1.0)));
    }
}

/// Plot the mass curve of a run, marking the snapshot currently on screen.
fn draw_mass_history(draw: &Draw, bounds: Rect, history: &[f64], step: usize) {
    let Some((min, max)) = minmax(&history.iter().map(|m| *m as f32).collect_vec()) else {
        return;
    };

    let max = if max > min { max } else { min + 1.0 };
    let steps = history.len().max(2) - 1;

    let point = |i: usize, m: f64| {
        pt2(
            map_range(i, 0, steps, bounds.left(), bounds.right()),
            map_range(m as f32, min, max, bounds.bottom(), bounds.top()),
        )
    };

    let points = history.iter().enumerate().map(|(i, m)| point(i, *m));

    draw.polyline().weight(2.0).color(BLACK).points(points);

    if let Some(m) = history.get(step) {
        draw.ellipse().xy(point(step, *m)).radius(5.0).color(RED);
    }
}
