//! IccXML serialization of a profile document.
//!
//! The external converter compiles an XML rendition of the profile into
//! the binary format; only the element subset this tool emits is
//! produced here. Header fields come first, then one element per tag in
//! document order.

use std::io::{self, Write};

use crate::icc::{DeviceClass, ProfileDocument, TagPayload, TagSignature};

/// Serializes `doc` as IccXML.
pub fn write_icc_xml<W: Write>(w: &mut W, doc: &ProfileDocument) -> io::Result<()> {
    let class = match doc.get(&TagSignature::DeviceClass) {
        Some(TagPayload::Class(class)) => *class,
        _ => DeviceClass::ColorSpace,
    };

    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(w, "<IccProfile>")?;
    writeln!(w, "  <Header>")?;
    writeln!(w, "    <ProfileDeviceClass>{}</ProfileDeviceClass>", class.code())?;
    writeln!(w, "    <DataColourSpace>RGB </DataColourSpace>")?;
    writeln!(w, "    <PCS>XYZ </PCS>")?;
    writeln!(w, "    <RenderingIntent>Perceptual</RenderingIntent>")?;
    writeln!(w, "  </Header>")?;
    writeln!(w, "  <Tags>")?;

    for (signature, payload) in doc.tags() {
        match payload {
            TagPayload::Colorant(value) => {
                writeln!(w, r#"    <XYZType TagSignature="{}">"#, signature.code())?;
                writeln!(
                    w,
                    r#"      <XYZNumber X="{:.8}" Y="{:.8}" Z="{:.8}"/>"#,
                    value.x, value.y, value.z
                )?;
                writeln!(w, "    </XYZType>")?;
            }
            TagPayload::Curve(curve) => {
                let samples = curve
                    .samples()
                    .iter()
                    .map(|sample| sample.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(w, r#"    <CurveType TagSignature="{}">"#, signature.code())?;
                writeln!(w, "      <Curve>{samples}</Curve>")?;
                writeln!(w, "    </CurveType>")?;
            }
            TagPayload::Text(text) => {
                writeln!(
                    w,
                    r#"    <TextDescriptionType TagSignature="{}">"#,
                    signature.code()
                )?;
                writeln!(w, "      <TextDescription>{}</TextDescription>", escape(text))?;
                writeln!(w, "    </TextDescriptionType>")?;
            }
            // Emitted as a header field above.
            TagPayload::Class(_) => {}
            TagPayload::Raw(_) => {
                tracing::debug!("dropping uninterpreted tag {signature} from XML output");
            }
        }
    }

    writeln!(w, "  </Tags>")?;
    writeln!(w, "</IccProfile>")?;

    Ok(())
}

/// Escapes text content for XML.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
