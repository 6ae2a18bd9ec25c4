//! Recursive-descent parser for scene files.
//!
//! A scene file is a flat list of statements: float variable
//! declarations, named materials, shapes, point lights and at most one
//! camera. The parser consumes tokens from an [`InputStream`] and
//! builds the world directly; every failure is a [`GrammarError`]
//! pointing at the offending token.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use lumina_core::{CheckeredTexture, ImageTexture, Texture, UniformTexture};
use lumina_math::{Color, Point3, Transformation, Vec3};
use lumina_renderer::{
    Camera, Diffuse, Material, Plane, PointLight, Projection, Specular, Sphere, World,
};
use thiserror::Error;

use crate::lexer::{GrammarError, InputStream, Keyword, SourceLocation, TokenKind};

/// Errors from loading a scene file.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// A parsed scene: the world to render, the camera observing it, and
/// the name tables the parser accumulated.
pub struct Scene {
    pub world: World,
    pub camera: Option<Camera>,
    pub materials: HashMap<String, Arc<dyn Material>>,
    pub float_variables: HashMap<String, f32>,
    /// Variables supplied by the caller; file definitions for these
    /// names are silently ignored.
    pub overridden_variables: HashSet<String>,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("camera", &self.camera.is_some())
            .field("materials", &self.materials.keys().collect::<Vec<_>>())
            .field("float_variables", &self.float_variables)
            .field("overridden_variables", &self.overridden_variables)
            .finish()
    }
}

impl Scene {
    /// Load and parse a scene file. `overrides` pre-binds float
    /// variables and wins over definitions in the file.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        overrides: &HashMap<String, f32>,
    ) -> Result<Scene, SceneError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut stream = InputStream::new(&text, &path.to_string_lossy());
        Ok(Self::parse(&mut stream, overrides)?)
    }

    /// Parse a scene from a token stream.
    pub fn parse(
        stream: &mut InputStream,
        overrides: &HashMap<String, f32>,
    ) -> Result<Scene, GrammarError> {
        let mut scene = Scene {
            world: World::new(),
            camera: None,
            materials: HashMap::new(),
            float_variables: overrides.clone(),
            overridden_variables: overrides.keys().cloned().collect(),
        };

        loop {
            let token = stream.read_token()?;
            let keyword = match token.kind {
                TokenKind::Eof => break,
                TokenKind::Keyword(keyword) => keyword,
                other => {
                    return Err(GrammarError::new(
                        token.location,
                        format!("expected a keyword, got {}", other),
                    ))
                }
            };

            match keyword {
                Keyword::Float => scene.parse_float_declaration(stream)?,
                Keyword::Material => scene.parse_material(stream)?,
                Keyword::Sphere => scene.parse_sphere(stream)?,
                Keyword::Plane => scene.parse_plane(stream)?,
                Keyword::PointLight => scene.parse_point_light(stream)?,
                Keyword::Camera => {
                    if scene.camera.is_some() {
                        return Err(GrammarError::new(
                            token.location,
                            "cannot define more than one camera",
                        ));
                    }
                    scene.parse_camera(stream)?;
                }
                other => {
                    return Err(GrammarError::new(
                        token.location,
                        format!("unexpected keyword \"{}\"", other),
                    ))
                }
            }
        }

        Ok(scene)
    }

    // expectation primitives

    fn expect_symbol(&self, stream: &mut InputStream, symbol: char) -> Result<(), GrammarError> {
        let token = stream.read_token()?;
        match token.kind {
            TokenKind::Symbol(c) if c == symbol => Ok(()),
            other => Err(GrammarError::new(
                token.location,
                format!("expected '{}', got {}", symbol, other),
            )),
        }
    }

    fn expect_keywords(
        &self,
        stream: &mut InputStream,
        keywords: &[Keyword],
    ) -> Result<Keyword, GrammarError> {
        let token = stream.read_token()?;
        let keyword = match token.kind {
            TokenKind::Keyword(keyword) => keyword,
            other => {
                return Err(GrammarError::new(
                    token.location,
                    format!("expected a keyword, got {}", other),
                ))
            }
        };

        if !keywords.contains(&keyword) {
            let expected: Vec<&str> = keywords.iter().map(|k| k.as_str()).collect();
            return Err(GrammarError::new(
                token.location,
                format!(
                    "expected one of {{{}}}, got \"{}\"",
                    expected.join(", "),
                    keyword
                ),
            ));
        }
        Ok(keyword)
    }

    /// A number literal, or an identifier resolved through the float
    /// variable table.
    fn expect_number(&self, stream: &mut InputStream) -> Result<f32, GrammarError> {
        let token = stream.read_token()?;
        match token.kind {
            TokenKind::NumberLiteral(value) => Ok(value),
            TokenKind::Identifier(name) => {
                self.float_variables.get(&name).copied().ok_or_else(|| {
                    GrammarError::new(token.location, format!("unknown variable \"{}\"", name))
                })
            }
            other => Err(GrammarError::new(
                token.location,
                format!("expected a number, got {}", other),
            )),
        }
    }

    fn expect_string(
        &self,
        stream: &mut InputStream,
    ) -> Result<(String, SourceLocation), GrammarError> {
        let token = stream.read_token()?;
        match token.kind {
            TokenKind::StringLiteral(value) => Ok((value, token.location)),
            other => Err(GrammarError::new(
                token.location,
                format!("expected a string, got {}", other),
            )),
        }
    }

    fn expect_identifier(&self, stream: &mut InputStream) -> Result<String, GrammarError> {
        let token = stream.read_token()?;
        match token.kind {
            TokenKind::Identifier(name) => Ok(name),
            other => Err(GrammarError::new(
                token.location,
                format!("expected an identifier, got {}", other),
            )),
        }
    }

    // composite parsers

    /// `[ x, y, z ]`
    fn parse_vector(&self, stream: &mut InputStream) -> Result<Vec3, GrammarError> {
        self.expect_symbol(stream, '[')?;
        let x = self.expect_number(stream)?;
        self.expect_symbol(stream, ',')?;
        let y = self.expect_number(stream)?;
        self.expect_symbol(stream, ',')?;
        let z = self.expect_number(stream)?;
        self.expect_symbol(stream, ']')?;
        Ok(Vec3::new(x, y, z))
    }

    /// `< r, g, b >`
    fn parse_color(&self, stream: &mut InputStream) -> Result<Color, GrammarError> {
        self.expect_symbol(stream, '<')?;
        let r = self.expect_number(stream)?;
        self.expect_symbol(stream, ',')?;
        let g = self.expect_number(stream)?;
        self.expect_symbol(stream, ',')?;
        let b = self.expect_number(stream)?;
        self.expect_symbol(stream, '>')?;
        Ok(Color::new(r, g, b))
    }

    /// `uniform(COLOR)`, `checkered(COLOR, COLOR, NUMBER)` or
    /// `image(STRING)`
    fn parse_texture(&self, stream: &mut InputStream) -> Result<Arc<dyn Texture>, GrammarError> {
        let keyword = self.expect_keywords(
            stream,
            &[Keyword::Uniform, Keyword::Checkered, Keyword::Image],
        )?;

        self.expect_symbol(stream, '(')?;
        let texture: Arc<dyn Texture> = match keyword {
            Keyword::Uniform => Arc::new(UniformTexture::new(self.parse_color(stream)?)),
            Keyword::Checkered => {
                let color1 = self.parse_color(stream)?;
                self.expect_symbol(stream, ',')?;
                let color2 = self.parse_color(stream)?;
                self.expect_symbol(stream, ',')?;
                let steps = self.expect_number(stream)? as u32;
                Arc::new(CheckeredTexture::new(color1, color2, steps))
            }
            _ => {
                let (file_name, location) = self.expect_string(stream)?;
                let texture = ImageTexture::load(&file_name).map_err(|error| {
                    GrammarError::new(
                        location,
                        format!("cannot load image \"{}\": {}", file_name, error),
                    )
                })?;
                Arc::new(texture)
            }
        };
        self.expect_symbol(stream, ')')?;

        Ok(texture)
    }

    /// `ATOM ('*' ATOM)*`, composed left to right.
    fn parse_transformation(
        &self,
        stream: &mut InputStream,
    ) -> Result<Transformation, GrammarError> {
        let mut result = Transformation::IDENTITY;

        loop {
            let keyword = self.expect_keywords(
                stream,
                &[
                    Keyword::Identity,
                    Keyword::Translation,
                    Keyword::RotationX,
                    Keyword::RotationY,
                    Keyword::RotationZ,
                    Keyword::Scaling,
                ],
            )?;

            match keyword {
                Keyword::Identity => {} // no factor to apply
                Keyword::Translation => {
                    self.expect_symbol(stream, '(')?;
                    result = result * Transformation::translation(self.parse_vector(stream)?);
                    self.expect_symbol(stream, ')')?;
                }
                Keyword::RotationX => {
                    self.expect_symbol(stream, '(')?;
                    result = result * Transformation::rotation_x(self.expect_number(stream)?);
                    self.expect_symbol(stream, ')')?;
                }
                Keyword::RotationY => {
                    self.expect_symbol(stream, '(')?;
                    result = result * Transformation::rotation_y(self.expect_number(stream)?);
                    self.expect_symbol(stream, ')')?;
                }
                Keyword::RotationZ => {
                    self.expect_symbol(stream, '(')?;
                    result = result * Transformation::rotation_z(self.expect_number(stream)?);
                    self.expect_symbol(stream, ')')?;
                }
                _ => {
                    self.expect_symbol(stream, '(')?;
                    let location = stream.location;
                    let factors = self.parse_vector(stream)?;
                    let scaling = Transformation::scaling(factors)
                        .map_err(|error| GrammarError::new(location, error.to_string()))?;
                    result = result * scaling;
                    self.expect_symbol(stream, ')')?;
                }
            }

            // keep composing while a '*' follows
            let token = stream.read_token()?;
            if token.kind != TokenKind::Symbol('*') {
                stream.unread_token(token);
                break;
            }
        }

        Ok(result)
    }

    // statements

    /// `float NAME ( NUMBER )`
    fn parse_float_declaration(&mut self, stream: &mut InputStream) -> Result<(), GrammarError> {
        let name = self.expect_identifier(stream)?;
        let location = stream.location;
        self.expect_symbol(stream, '(')?;
        let value = self.expect_number(stream)?;
        self.expect_symbol(stream, ')')?;

        if self.overridden_variables.contains(&name) {
            // the caller's value wins, silently
            return Ok(());
        }
        if self.float_variables.contains_key(&name) {
            return Err(GrammarError::new(
                location,
                format!("redefinition of variable \"{}\"", name),
            ));
        }

        self.float_variables.insert(name, value);
        Ok(())
    }

    /// `material NAME ( (diffuse|specular) ( TEXTURE , TEXTURE ) )`
    fn parse_material(&mut self, stream: &mut InputStream) -> Result<(), GrammarError> {
        let name = self.expect_identifier(stream)?;
        self.expect_symbol(stream, '(')?;

        let kind = self.expect_keywords(stream, &[Keyword::Diffuse, Keyword::Specular])?;

        self.expect_symbol(stream, '(')?;
        let albedo = self.parse_texture(stream)?;
        self.expect_symbol(stream, ',')?;
        let emitted = self.parse_texture(stream)?;
        self.expect_symbol(stream, ')')?;

        self.expect_symbol(stream, ')')?;

        let material: Arc<dyn Material> = match kind {
            Keyword::Diffuse => Arc::new(Diffuse::new(albedo, emitted)),
            _ => Arc::new(Specular::new(albedo, emitted)),
        };
        self.materials.insert(name, material);
        Ok(())
    }

    fn lookup_material(
        &self,
        name: &str,
        location: SourceLocation,
    ) -> Result<Arc<dyn Material>, GrammarError> {
        self.materials.get(name).cloned().ok_or_else(|| {
            GrammarError::new(location, format!("unknown material \"{}\"", name))
        })
    }

    /// `sphere ( MATERIAL_NAME , TRANSFORMATION )`
    fn parse_sphere(&mut self, stream: &mut InputStream) -> Result<(), GrammarError> {
        self.expect_symbol(stream, '(')?;
        let name = self.expect_identifier(stream)?;
        let material = self.lookup_material(&name, stream.location)?;

        self.expect_symbol(stream, ',')?;
        let transformation = self.parse_transformation(stream)?;
        self.expect_symbol(stream, ')')?;

        self.world
            .add_shape(Arc::new(Sphere::new(material, transformation)));
        Ok(())
    }

    /// `plane ( MATERIAL_NAME , TRANSFORMATION )`
    fn parse_plane(&mut self, stream: &mut InputStream) -> Result<(), GrammarError> {
        self.expect_symbol(stream, '(')?;
        let name = self.expect_identifier(stream)?;
        let material = self.lookup_material(&name, stream.location)?;

        self.expect_symbol(stream, ',')?;
        let transformation = self.parse_transformation(stream)?;
        self.expect_symbol(stream, ')')?;

        self.world
            .add_shape(Arc::new(Plane::new(material, transformation)));
        Ok(())
    }

    /// `pointLight ( VECTOR , COLOR , NUMBER )`
    fn parse_point_light(&mut self, stream: &mut InputStream) -> Result<(), GrammarError> {
        self.expect_symbol(stream, '(')?;
        let position = self.parse_vector(stream)?;
        self.expect_symbol(stream, ',')?;
        let color = self.parse_color(stream)?;
        self.expect_symbol(stream, ',')?;
        let radius = self.expect_number(stream)?;
        self.expect_symbol(stream, ')')?;

        self.world
            .add_light(PointLight::new(Point3(position), color, radius));
        Ok(())
    }

    /// `camera ( (perspective|orthogonal) , NUMBER , NUMBER , NUMBER ,
    /// TRANSFORMATION )`
    fn parse_camera(&mut self, stream: &mut InputStream) -> Result<(), GrammarError> {
        self.expect_symbol(stream, '(')?;
        let kind = self.expect_keywords(stream, &[Keyword::Perspective, Keyword::Orthogonal])?;
        self.expect_symbol(stream, ',')?;
        let aspect_ratio = self.expect_number(stream)?;
        self.expect_symbol(stream, ',')?;
        let image_width = self.expect_number(stream)? as u32;
        self.expect_symbol(stream, ',')?;
        let distance = self.expect_number(stream)?;
        self.expect_symbol(stream, ',')?;
        let transformation = self.parse_transformation(stream)?;
        self.expect_symbol(stream, ')')?;

        let projection = match kind {
            Keyword::Perspective => Projection::Perspective,
            _ => Projection::Orthogonal,
        };
        self.camera = Some(Camera::new(
            projection,
            aspect_ratio,
            image_width,
            distance,
            transformation,
        ));
        Ok(())
    }
}
