//! Lumina command-line front-end.
//!
//! Two subcommands:
//!
//! - `convert`: tone-map an existing PFM image into an LDR format
//! - `render`: parse a scene file, render it with the selected
//!   algorithm, and save both the raw PFM and the tone-mapped output

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lumina_core::HdrImage;
use lumina_math::{Transformation, Vec3};
use lumina_renderer::{Camera, Flat, OnOff, PathTracer, PointLightTracer, Projection};
use lumina_scene::Scene;

#[derive(Parser)]
#[command(
    name = "lumina",
    version,
    about = "Offline physically-based renderer",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a .pfm image to another format
    Convert {
        /// Input .pfm file
        #[arg(short, long)]
        input: PathBuf,

        /// Output image file (.pfm, .png, .jpg, .jpeg)
        #[arg(short, long)]
        output: PathBuf,

        /// Normalization factor
        #[arg(short = 'a', long, default_value_t = 0.2)]
        normalization: f32,

        /// Gamma correction
        #[arg(short, long, default_value_t = 1.0)]
        gamma: f32,

        /// Manually set the image luminosity, useful on dark images
        #[arg(short, long)]
        luminosity: Option<f32>,
    },

    /// Render a scene description file
    Render {
        /// Input scene description file
        #[arg(short, long)]
        input: PathBuf,

        /// Output image; the raw .pfm is always saved alongside it
        #[arg(short, long, default_value = "image.png")]
        output: PathBuf,

        /// Image width in pixels, overriding the scene camera
        #[arg(short, long)]
        width: Option<u32>,

        /// Aspect ratio, overriding the scene camera
        #[arg(short = 'r', long)]
        aspect_ratio: Option<f32>,

        /// Normalization factor for the LDR output
        #[arg(short = 'a', long, default_value_t = 1.0)]
        normalization: f32,

        /// Gamma correction for the LDR output
        #[arg(short, long, default_value_t = 1.0)]
        gamma: f32,

        /// Manually set the image luminosity, useful on dark images
        #[arg(short, long)]
        luminosity: Option<f32>,

        /// Rendering algorithm
        #[arg(short = 'R', long, value_enum, default_value_t = Algorithm::Path)]
        algorithm: Algorithm,

        /// Anti-aliasing samples per pixel; perfect squares sample a
        /// stratified grid
        #[arg(short = 'A', long, default_value_t = 4)]
        aa_samples: u32,

        /// Path tracer: rays scattered from every hit point
        #[arg(short, long, default_value_t = 3)]
        n_rays: u32,

        /// Path tracer: maximum ray depth
        #[arg(short = 'd', long, default_value_t = 5)]
        max_depth: u32,

        /// Path tracer: ray depth where Russian roulette starts
        #[arg(short = 'L', long, default_value_t = 3)]
        rr_limit: u32,

        /// Float variable overrides; they silently win over the
        /// definitions in the scene file
        #[arg(short = 'f', long = "float", value_name = "NAME:VALUE")]
        floats: Vec<String>,

        /// Seed of the random number generator
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Sequence identifier of the random number generator
        #[arg(long, default_value_t = 54)]
        sequence: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Algorithm {
    /// Monte Carlo path tracing
    Path,
    /// White where geometry is hit, black elsewhere
    Onoff,
    /// Flat material colors, no lighting
    Flat,
    /// Ambient plus direct point-light illumination
    Light,
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Convert {
            input,
            output,
            normalization,
            gamma,
            luminosity,
        } => convert(&input, &output, normalization, gamma, luminosity),
        Command::Render {
            input,
            output,
            width,
            aspect_ratio,
            normalization,
            gamma,
            luminosity,
            algorithm,
            aa_samples,
            n_rays,
            max_depth,
            rr_limit,
            floats,
            seed,
            sequence,
        } => render(RenderArgs {
            input,
            output,
            width,
            aspect_ratio,
            normalization,
            gamma,
            luminosity,
            algorithm,
            aa_samples,
            n_rays,
            max_depth,
            rr_limit,
            floats,
            seed,
            sequence,
        }),
    }
}

fn convert(
    input: &PathBuf,
    output: &PathBuf,
    normalization: f32,
    gamma: f32,
    luminosity: Option<f32>,
) -> Result<()> {
    let mut image = HdrImage::from_pfm_file(input)
        .with_context(|| format!("cannot read \"{}\"", input.display()))?;

    image.normalize(normalization, luminosity);
    image.clamp();
    image
        .save(output, gamma)
        .with_context(|| format!("cannot write \"{}\"", output.display()))?;

    log::info!("converted {} to {}", input.display(), output.display());
    Ok(())
}

struct RenderArgs {
    input: PathBuf,
    output: PathBuf,
    width: Option<u32>,
    aspect_ratio: Option<f32>,
    normalization: f32,
    gamma: f32,
    luminosity: Option<f32>,
    algorithm: Algorithm,
    aa_samples: u32,
    n_rays: u32,
    max_depth: u32,
    rr_limit: u32,
    floats: Vec<String>,
    seed: u64,
    sequence: u64,
}

/// Split a `name:value` variable override.
fn parse_float_override(spec: &str) -> Result<(String, f32)> {
    let Some((name, value)) = spec.split_once(':') else {
        bail!(
            "\"{}\" does not define a float variable, the syntax is name:value",
            spec
        );
    };
    let value: f32 = value
        .parse()
        .with_context(|| format!("\"{}\" is not a valid number", value))?;
    Ok((name.to_string(), value))
}

fn render(args: RenderArgs) -> Result<()> {
    let mut overrides = HashMap::new();
    for spec in &args.floats {
        let (name, value) = parse_float_override(spec)?;
        overrides.insert(name, value);
    }

    let scene = Scene::from_file(&args.input, &overrides)
        .with_context(|| format!("cannot load scene \"{}\"", args.input.display()))?;
    let world = scene.world;

    let mut camera = scene.camera.unwrap_or_else(|| {
        Camera::new(
            Projection::Perspective,
            1.0,
            100,
            1.0,
            Transformation::translation(Vec3::new(-1.0, 0.0, 0.0)),
        )
    });
    camera.seed(args.seed, args.sequence);

    // reshape the image from the command line
    if args.width.is_some() || args.aspect_ratio.is_some() {
        let width = args.width.unwrap_or_else(|| camera.width());
        let aspect_ratio = args.aspect_ratio.unwrap_or(camera.aspect_ratio);
        camera.resize(width, aspect_ratio);
    }

    match args.algorithm {
        Algorithm::Path => camera.render(
            &world,
            &PathTracer {
                n_rays: args.n_rays,
                max_depth: args.max_depth,
                rr_limit: args.rr_limit,
            },
            args.aa_samples,
        ),
        Algorithm::Onoff => camera.render(&world, &OnOff, args.aa_samples),
        Algorithm::Flat => camera.render(&world, &Flat, args.aa_samples),
        Algorithm::Light => camera.render(&world, &PointLightTracer::default(), args.aa_samples),
    }

    // the raw radiance image is always kept next to the LDR output
    let pfm_output = args.output.with_extension("pfm");
    camera
        .image
        .save(&pfm_output, 1.0)
        .with_context(|| format!("cannot write \"{}\"", pfm_output.display()))?;

    camera.image.normalize(args.normalization, args.luminosity);
    camera.image.clamp();
    camera
        .image
        .save(&args.output, args.gamma)
        .with_context(|| format!("cannot write \"{}\"", args.output.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_declaration() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_float_override() {
        let (name, value) = parse_float_override("clock:150").unwrap();
        assert_eq!(name, "clock");
        assert_eq!(value, 150.0);

        let (_, negative) = parse_float_override("angle:-12.5").unwrap();
        assert_eq!(negative, -12.5);

        assert!(parse_float_override("clock").is_err());
        assert!(parse_float_override("clock:abc").is_err());
    }

    #[test]
    fn test_render_defaults() {
        let cli = Cli::try_parse_from(["lumina", "render", "--input", "scene.txt"]).unwrap();
        let Command::Render {
            algorithm,
            aa_samples,
            n_rays,
            max_depth,
            rr_limit,
            seed,
            sequence,
            ..
        } = cli.command
        else {
            panic!("expected the render subcommand");
        };

        assert_eq!(algorithm, Algorithm::Path);
        assert_eq!(aa_samples, 4);
        assert_eq!(n_rays, 3);
        assert_eq!(max_depth, 5);
        assert_eq!(rr_limit, 3);
        assert_eq!(seed, 42);
        assert_eq!(sequence, 54);
    }
}
