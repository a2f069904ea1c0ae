use crate::error::PageError;
use crate::surface::Surface;
use crate::types::{Pt, Size};
use lopdf::{Document as LoDocument, Object as LoObject};
use sha2::{Digest, Sha256};
use std::fmt::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct Engine {
    source: Option<PathBuf>,
    surfaces: Vec<Surface>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_surfaces(surfaces: Vec<Surface>) -> Self {
        Self {
            source: None,
            surfaces,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PageError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Ok(Engine::load_bytes(&bytes)?.with_source(path))
    }

    pub(crate) fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn load_bytes(bytes: &[u8]) -> Result<Self, PageError> {
        let doc = LoDocument::load_mem(bytes)?;
        if doc.is_encrypted() {
            return Err(PageError::TemplateSource(
                "template PDF is encrypted".to_string(),
            ));
        }
        let mut surfaces = Vec::new();
        for (_, page_id) in doc.get_pages() {
            let page = doc.get_object(page_id).and_then(LoObject::as_dict)?;
            let size = page_size(page);
            let content = doc.get_page_content(page_id)?;
            surfaces.push(Surface::with_imported_content(size, content));
        }
        Ok(Engine {
            source: None,
            surfaces,
        })
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn create_surface(&self, size_spec: &str) -> Result<Surface, PageError> {
        let size = Size::parse_spec(size_spec)?;
        Ok(Surface::new(size))
    }

    pub fn attach(&mut self, surface: Surface) {
        self.surfaces.push(surface);
    }

    pub fn attached_surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn into_surfaces(self) -> Vec<Surface> {
        self.surfaces
    }
}

fn page_size(page: &lopdf::Dictionary) -> Size {
    let media_box = page
        .get(b"CropBox")
        .or_else(|_| page.get(b"MediaBox"))
        .and_then(LoObject::as_array);
    let Ok(values) = media_box else {
        return Size::new(Pt::from_i32(612), Pt::from_i32(792));
    };
    let nums: Vec<f64> = values.iter().filter_map(number).collect();
    if nums.len() < 4 {
        return Size::new(Pt::from_i32(612), Pt::from_i32(792));
    }
    Size::new(
        Pt::from_f64((nums[2] - nums[0]).abs()),
        Pt::from_f64((nums[3] - nums[1]).abs()),
    )
}

fn number(obj: &LoObject) -> Option<f64> {
    match obj {
        LoObject::Integer(value) => Some(*value as f64),
        LoObject::Real(value) => Some(*value as f64),
        _ => None,
    }
}

pub(crate) fn hex_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{Stream as LoStream, dictionary};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn make_template_pdf(page_sizes: &[(i64, i64)]) -> Vec<u8> {
        let mut doc = LoDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<LoObject> = Vec::new();
        for (index, (width, height)) in page_sizes.iter().enumerate() {
            let content = format!("q 0 0 1 rg 0 0 10 10 re f Q % page {}", index + 1).into_bytes();
            let content_id = doc.add_object(LoStream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), (*width).into(), (*height).into()],
            });
            kids.push(page_id.into());
        }
        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        };
        doc.objects.insert(pages_id, LoObject::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).expect("save pdf");
        out
    }

    pub(crate) fn temp_pdf_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!(
            "pagesetter_{tag}_{}_{}.pdf",
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn load_attaches_one_surface_per_page() {
        let bytes = make_template_pdf(&[(612, 792), (300, 400)]);
        let path = temp_pdf_path("engine_load");
        std::fs::write(&path, &bytes).expect("write pdf");

        let engine = Engine::load(&path).expect("load template");
        let surfaces = engine.attached_surfaces();
        assert_eq!(surfaces.len(), 2);
        assert_eq!(surfaces[0].size(), Size::new(Pt::from_i32(612), Pt::from_i32(792)));
        assert_eq!(surfaces[1].size(), Size::new(Pt::from_i32(300), Pt::from_i32(400)));
        assert!(matches!(
            surfaces[1].commands().first(),
            Some(crate::surface::Command::Imported { .. })
        ));
        assert_eq!(engine.source(), Some(path.as_path()));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_rejects_non_pdf_bytes() {
        let err = Engine::load_bytes(b"not a pdf").expect_err("garbage input");
        assert!(matches!(err, PageError::TemplateSource(_)));
    }

    #[test]
    fn create_surface_uses_size_spec() {
        let engine = Engine::new();
        let surface = engine.create_surface("300:200").expect("surface");
        assert_eq!(surface.width(), Pt::from_i32(300));
        assert_eq!(surface.height(), Pt::from_i32(200));
        assert!(engine.create_surface("300").is_err());
    }

    #[test]
    fn sha256_is_lower_hex() {
        assert_eq!(
            hex_sha256(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
