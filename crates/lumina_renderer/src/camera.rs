//! Camera and the anti-aliased render loop.
//!
//! The camera maps pixel indices to primary rays in its own reference
//! frame (looking down +x) and moves them into the world with its
//! transformation. It owns the image it renders into and the PCG
//! stream that drives sub-pixel sampling, so a render is fully
//! reproducible from `(seed, sequence)`.

use std::time::Instant;

use lumina_core::HdrImage;
use lumina_math::{Color, Pcg, PcgSample, Point3, Ray, Transformation, Vec3, BLACK};

use crate::renderer::Renderer;
use crate::world::World;

/// How primary rays leave the screen plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Parallel rays along +x.
    Orthogonal,
    /// Rays from a common observer at distance `d` behind the screen.
    Perspective,
}

/// A camera observing the scene, together with its image buffer and
/// random stream.
pub struct Camera {
    pub projection: Projection,
    pub aspect_ratio: f32,
    pub transformation: Transformation,
    pub image: HdrImage,
    pub pcg: Pcg,
    distance: f32,
}

impl Camera {
    /// Create a camera with a black `width x (width / aspect_ratio)`
    /// image. The observer distance only matters for the perspective
    /// projection; orthogonal cameras sit at distance 1.
    pub fn new(
        projection: Projection,
        aspect_ratio: f32,
        image_width: u32,
        distance: f32,
        transformation: Transformation,
    ) -> Self {
        let image_height = (image_width as f32 / aspect_ratio) as u32;
        let distance = match projection {
            Projection::Orthogonal => 1.0,
            Projection::Perspective => distance,
        };

        Self {
            projection,
            aspect_ratio,
            transformation,
            image: HdrImage::new(image_width, image_height),
            pcg: Pcg::new(42, 54),
            distance,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Replace the random stream, typically before a render.
    pub fn seed(&mut self, state: u64, sequence: u64) {
        self.pcg = Pcg::new(state, sequence);
    }

    /// Rebuild the image buffer for a new width and aspect ratio,
    /// discarding any rendered pixels.
    pub fn resize(&mut self, image_width: u32, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.image = HdrImage::new(image_width, (image_width as f32 / aspect_ratio) as u32);
    }

    /// Primary ray through pixel (i, j) at sub-pixel offset
    /// `(u_pixel, v_pixel)` in [0, 1]^2; (0.5, 0.5) is the center.
    ///
    /// Screen coordinates run left to right and top to bottom: pixel
    /// (0, 0) with offset (0, 0) is the top-left corner of the image.
    pub fn cast_ray(&self, i: u32, j: u32, u_pixel: f32, v_pixel: f32) -> Ray {
        let u = (i as f32 + u_pixel) / self.width() as f32;
        let v = 1.0 - (j as f32 + v_pixel) / self.height() as f32;

        let ray = match self.projection {
            Projection::Orthogonal => Ray::new(
                Point3::new(-1.0, (1.0 - 2.0 * u) * self.aspect_ratio, 2.0 * v - 1.0),
                Vec3::X,
            ),
            Projection::Perspective => Ray::new(
                Point3::new(-self.distance, 0.0, 0.0),
                Vec3::new(
                    self.distance,
                    (1.0 - 2.0 * u) * self.aspect_ratio,
                    2.0 * v - 1.0,
                ),
            ),
        };

        ray.transform(&self.transformation)
    }

    /// Render the whole image with `aa_samples` rays per pixel.
    ///
    /// One sample goes through the pixel center; a perfect square uses
    /// a stratified jittered grid; any other count falls back to
    /// uniform jitter. Pixels are filled row by row, left to right.
    pub fn render<R: Renderer>(&mut self, world: &World, renderer: &R, aa_samples: u32) {
        let aa_root = (aa_samples as f32).sqrt().round() as u32;
        let stratified = aa_root * aa_root == aa_samples;

        let start = Instant::now();
        for j in 0..self.height() {
            log::debug!("rendering row {}/{}", j + 1, self.height());
            for i in 0..self.width() {
                let color = if aa_samples == 1 {
                    self.sample_pixel(i, j, 0.5, 0.5, world, renderer)
                } else if stratified {
                    self.stratified_sampling(i, j, aa_root, world, renderer)
                } else {
                    self.uniform_sampling(i, j, aa_samples, world, renderer)
                };
                self.image.set_pixel(i, j, color);
            }
        }
        log::info!(
            "rendered {}x{} image in {:.2} s",
            self.width(),
            self.height(),
            start.elapsed().as_secs_f32()
        );
    }

    fn sample_pixel<R: Renderer>(
        &mut self,
        i: u32,
        j: u32,
        u_pixel: f32,
        v_pixel: f32,
        world: &World,
        renderer: &R,
    ) -> Color {
        let ray = self.cast_ray(i, j, u_pixel, v_pixel);
        renderer.radiance(ray, world, &mut self.pcg)
    }

    /// `samples` rays at uniformly random positions inside the pixel.
    fn uniform_sampling<R: Renderer>(
        &mut self,
        i: u32,
        j: u32,
        samples: u32,
        world: &World,
        renderer: &R,
    ) -> Color {
        let mut sum = BLACK;
        for _ in 0..samples {
            let u_pixel = self.pcg.random();
            let v_pixel = self.pcg.random();
            sum += self.sample_pixel(i, j, u_pixel, v_pixel, world, renderer);
        }
        sum / samples as f32
    }

    /// One jittered ray per cell of a side x side grid over the pixel.
    fn stratified_sampling<R: Renderer>(
        &mut self,
        i: u32,
        j: u32,
        side: u32,
        world: &World,
        renderer: &R,
    ) -> Color {
        let mut sum = BLACK;
        for j_cell in 0..side {
            for i_cell in 0..side {
                let u_pixel = (i_cell as f32 + self.pcg.random()) / side as f32;
                let v_pixel = (j_cell as f32 + self.pcg.random()) / side as f32;
                sum += self.sample_pixel(i, j, u_pixel, v_pixel, world, renderer);
            }
        }
        sum / (side * side) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corners(camera: &Camera) -> [Ray; 4] {
        let (right, bottom) = (camera.width() - 1, camera.height() - 1);
        [
            camera.cast_ray(0, 0, 0.0, 0.0),          // top left
            camera.cast_ray(right, 0, 1.0, 0.0),      // top right
            camera.cast_ray(0, bottom, 0.0, 1.0),     // bottom left
            camera.cast_ray(right, bottom, 1.0, 1.0), // bottom right
        ]
    }

    #[test]
    fn test_orthogonal_corners() {
        let camera = Camera::new(
            Projection::Orthogonal,
            2.0,
            4,
            1.0,
            Transformation::IDENTITY,
        );
        let [top_left, top_right, bottom_left, bottom_right] = corners(&camera);

        assert!(top_left.at(1.0).is_close(Point3::new(0.0, 2.0, 1.0), 1e-5));
        assert!(top_right.at(1.0).is_close(Point3::new(0.0, -2.0, 1.0), 1e-5));
        assert!(bottom_left
            .at(1.0)
            .is_close(Point3::new(0.0, 2.0, -1.0), 1e-5));
        assert!(bottom_right
            .at(1.0)
            .is_close(Point3::new(0.0, -2.0, -1.0), 1e-5));
    }

    #[test]
    fn test_orthogonal_rays_are_parallel() {
        let camera = Camera::new(
            Projection::Orthogonal,
            2.0,
            4,
            1.0,
            Transformation::IDENTITY,
        );
        let rays = corners(&camera);

        for ray in &rays[1..] {
            assert!(rays[0].direction.cross(ray.direction).length_squared() < 1e-10);
        }
    }

    #[test]
    fn test_perspective_rays_share_origin() {
        let camera = Camera::new(
            Projection::Perspective,
            2.0,
            4,
            1.0,
            Transformation::IDENTITY,
        );
        let rays = corners(&camera);

        for ray in &rays[1..] {
            assert!(ray.origin.is_close(rays[0].origin, 1e-6));
        }
    }

    #[test]
    fn test_perspective_corners() {
        let camera = Camera::new(
            Projection::Perspective,
            2.0,
            4,
            1.0,
            Transformation::IDENTITY,
        );
        let [top_left, _, _, bottom_right] = corners(&camera);

        assert!(top_left.at(1.0).is_close(Point3::new(0.0, 2.0, 1.0), 1e-5));
        assert!(bottom_right
            .at(1.0)
            .is_close(Point3::new(0.0, -2.0, -1.0), 1e-5));
    }

    #[test]
    fn test_adjacent_pixels_share_corners() {
        let camera = Camera::new(
            Projection::Perspective,
            2.0,
            4,
            1.0,
            Transformation::IDENTITY,
        );

        // offset (2.5, 1.5) from pixel (0, 0) is the center of (2, 1)
        let ray1 = camera.cast_ray(0, 0, 2.5, 1.5);
        let ray2 = camera.cast_ray(2, 1, 0.5, 0.5);
        assert!(ray1.is_close(&ray2, 1e-5));
    }

    #[test]
    fn test_transformed_camera() {
        let camera = Camera::new(
            Projection::Orthogonal,
            2.0,
            200,
            1.0,
            Transformation::translation(Vec3::new(0.0, -2.0, 0.0))
                * Transformation::rotation_z(90.0),
        );

        let center = camera.cast_ray(100, 50, 0.0, 0.0);
        assert!(center.at(1.0).is_close(Point3::new(0.0, -2.0, 0.0), 1e-4));
    }

    struct Constant(Color);

    impl Renderer for Constant {
        fn radiance(&self, _ray: Ray, _world: &World, _pcg: &mut Pcg) -> Color {
            self.0
        }
    }

    #[test]
    fn test_render_covers_every_pixel() {
        let color = Color::new(1.0, 2.0, 3.0);
        let world = World::new();

        // 1 sample (center), 4 (stratified) and 3 (uniform jitter) all
        // walk the same pixel grid
        for aa_samples in [1, 4, 3] {
            let mut camera = Camera::new(
                Projection::Perspective,
                2.0,
                4,
                1.0,
                Transformation::IDENTITY,
            );
            camera.render(&world, &Constant(color), aa_samples);

            for j in 0..camera.height() {
                for i in 0..camera.width() {
                    assert!(camera.image.get_pixel(i, j).abs_diff_eq(color, 1e-5));
                }
            }
        }
    }
}
