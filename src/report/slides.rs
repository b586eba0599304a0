use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::processor::{ProcessorError, statistics::StatisticsRecord};
use crate::report::{DocumentRenderer, REPORT_TITLE, report_lines};

const NS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
    r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#,
    r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
    r#"<Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
    r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
    r#"</Types>"#
);

const EMPTY_TREE: &str = concat!(
    r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr/></p:spTree>"#
);

const THEME: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme">"#,
    r#"<a:themeElements>"#,
    r#"<a:clrScheme name="Office">"#,
    r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#,
    r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
    r#"<a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2>"#,
    r#"<a:accent1><a:srgbClr val="4F81BD"/></a:accent1><a:accent2><a:srgbClr val="C0504D"/></a:accent2>"#,
    r#"<a:accent3><a:srgbClr val="9BBB59"/></a:accent3><a:accent4><a:srgbClr val="8064A2"/></a:accent4>"#,
    r#"<a:accent5><a:srgbClr val="4BACC6"/></a:accent5><a:accent6><a:srgbClr val="F79646"/></a:accent6>"#,
    r#"<a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink>"#,
    r#"</a:clrScheme>"#,
    r#"<a:fontScheme name="Office">"#,
    r#"<a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
    r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
    r#"</a:fontScheme>"#,
    r#"<a:fmtScheme name="Office">"#,
    r#"<a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst>"#,
    r#"<a:lnStyleLst><a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="25400"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="38100"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst>"#,
    r#"<a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle>"#,
    r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
    r#"<a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>"#,
    r#"<a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst>"#,
    r#"</a:fmtScheme>"#,
    r#"</a:themeElements>"#,
    r#"</a:theme>"#
);

// 4:3 slide in EMU
const SLIDE_CX: u64 = 9_144_000;
const SLIDE_CY: u64 = 6_858_000;

/// One-slide Office Open XML presentation ("Title and Content")
#[derive(Debug, Default, Clone, Copy)]
pub struct SlideDeck;

impl SlideDeck {
    fn parts(stats: &StatisticsRecord) -> Vec<(&'static str, String)> {
        vec![
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            (
                "_rels/.rels",
                relationships(&[(
                    "rId1",
                    "officeDocument",
                    "ppt/presentation.xml",
                )]),
            ),
            ("ppt/presentation.xml", presentation()),
            (
                "ppt/_rels/presentation.xml.rels",
                relationships(&[
                    ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
                    ("rId2", "slide", "slides/slide1.xml"),
                    ("rId3", "theme", "theme/theme1.xml"),
                ]),
            ),
            ("ppt/slideMasters/slideMaster1.xml", slide_master()),
            (
                "ppt/slideMasters/_rels/slideMaster1.xml.rels",
                relationships(&[
                    ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                    ("rId2", "theme", "../theme/theme1.xml"),
                ]),
            ),
            ("ppt/slideLayouts/slideLayout1.xml", slide_layout()),
            (
                "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
                relationships(&[(
                    "rId1",
                    "slideMaster",
                    "../slideMasters/slideMaster1.xml",
                )]),
            ),
            ("ppt/slides/slide1.xml", slide(stats)),
            (
                "ppt/slides/_rels/slide1.xml.rels",
                relationships(&[(
                    "rId1",
                    "slideLayout",
                    "../slideLayouts/slideLayout1.xml",
                )]),
            ),
            ("ppt/theme/theme1.xml", THEME.to_string()),
        ]
    }
}

impl DocumentRenderer for SlideDeck {
    fn name(&self) -> &'static str {
        "slides"
    }

    fn render(&self, stats: &StatisticsRecord, path: &Path) -> Result<(), ProcessorError> {
        let file = File::create(path)?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, body) in Self::parts(stats) {
            zip.start_file(name, options)?;
            zip.write_all(body.as_bytes())?;
        }

        let mut writer = zip.finish()?;
        writer.flush()?;

        info!(path = %path.display(), "wrote slide deck");
        Ok(())
    }
}

fn relationships(rels: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(r#"{}<Relationships xmlns="{}">"#, XML_DECL, REL_NS);
    for (id, kind, target) in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
            id, REL_TYPE, kind, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn presentation() -> String {
    format!(
        concat!(
            "{}<p:presentation {}>",
            r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
            r#"<p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst>"#,
            r#"<p:sldSz cx="{}" cy="{}" type="screen4x3"/>"#,
            r#"<p:notesSz cx="{}" cy="{}"/>"#,
            "</p:presentation>"
        ),
        XML_DECL, NS, SLIDE_CX, SLIDE_CY, SLIDE_CY, SLIDE_CX
    )
}

fn slide_master() -> String {
    format!(
        concat!(
            "{}<p:sldMaster {}><p:cSld>{}</p:cSld>",
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
            r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" "#,
            r#"hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            "</p:sldMaster>"
        ),
        XML_DECL, NS, EMPTY_TREE
    )
}

fn slide_layout() -> String {
    format!(
        concat!(
            r#"{}<p:sldLayout {} type="obj" preserve="1">"#,
            r#"<p:cSld name="Title and Content">{}</p:cSld>"#,
            r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#,
            "</p:sldLayout>"
        ),
        XML_DECL, NS, EMPTY_TREE
    )
}

fn text_shape(id: u32, name: &str, y: u64, cy: u64, size: u32, lines: &[String]) -> String {
    let margin = 457_200;
    let paragraphs: String = lines
        .iter()
        .map(|line| {
            format!(
                r#"<a:p><a:r><a:rPr lang="en-US" sz="{}" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
                size,
                escape_xml(line)
            )
        })
        .collect();

    format!(
        concat!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
            r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
            r#"<p:txBody><a:bodyPr wrap="square"/><a:lstStyle/>{}</p:txBody></p:sp>"#
        ),
        id,
        name,
        margin,
        y,
        SLIDE_CX - 2 * margin,
        cy,
        paragraphs
    )
}

fn slide(stats: &StatisticsRecord) -> String {
    let title = text_shape(2, "Title 1", 274_638, 1_143_000, 4400, &[REPORT_TITLE.to_string()]);
    let body = text_shape(3, "Content Placeholder 2", 1_600_200, 4_525_963, 2800, &report_lines(stats));

    format!(
        concat!(
            "{}<p:sld {}><p:cSld><p:spTree>",
            r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#,
            "{}{}</p:spTree></p:cSld>",
            r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#,
            "</p:sld>"
        ),
        XML_DECL, NS, title, body
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    #[test]
    fn test_deck_contains_statistics() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("presentation.pptx");
        let stats = StatisticsRecord::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        SlideDeck.render(&stats, &path).unwrap();

        let mut archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();
        for (name, _) in SlideDeck::parts(&stats) {
            assert!(archive.by_name(name).is_ok(), "missing part {}", name);
        }

        let mut slide = String::new();
        archive
            .by_name("ppt/slides/slide1.xml")
            .unwrap()
            .read_to_string(&mut slide)
            .unwrap();
        assert!(slide.contains("<a:t>Data Analysis Report</a:t>"));
        assert!(slide.contains("<a:t>Mean: 3</a:t>"));
        assert!(slide.contains("<a:t>Median: 3</a:t>"));
        assert!(slide.contains("<a:t>Standard Deviation: 1.58"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
