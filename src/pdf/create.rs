//! Single-page PDF creation from a bitmap using lopdf

use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::Result;
use crate::layout::{PageLayout, Placement};
use crate::pdf::metadata::DocumentInfo;

/// Resource name of the embedded image on its page
const IMAGE_NAME: &str = "Im1";

/// Build a one-page document with `image` fitted and centered on an A4 page
pub fn image_page_document(image: &DynamicImage, info: &DocumentInfo) -> Result<Document> {
    image_page_document_with_layout(image, info, &PageLayout::default())
}

/// Same as [`image_page_document`] with an explicit page layout
pub fn image_page_document_with_layout(
    image: &DynamicImage,
    info: &DocumentInfo,
    layout: &PageLayout,
) -> Result<Document> {
    let placement = layout.fit_centered(image.width(), image.height());

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = embed_image(&mut doc, image);

    let content = Content {
        operations: draw_image_operations(&placement),
    };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            real(layout.page.width),
            real(layout.page.height),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                IMAGE_NAME => image_id,
            },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    info.apply(&mut doc);
    doc.compress();

    Ok(doc)
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// `q w 0 0 h x y cm /Im1 Do Q`
fn draw_image_operations(placement: &Placement) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                real(placement.width),
                0.into(),
                0.into(),
                real(placement.height),
                real(placement.x),
                real(placement.y),
            ],
        ),
        Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

/// Add `image` as an RGB image XObject, with an SMask when it has alpha
fn embed_image(doc: &mut Document, image: &DynamicImage) -> ObjectId {
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width,
        "Height" => height,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };

    if image.color().has_alpha() {
        let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        ));
        dict.set("SMask", mask_id);
    }

    doc.add_object(Stream::new(dict, image.to_rgb8().into_raw()))
}
