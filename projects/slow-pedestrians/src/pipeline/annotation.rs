// Annotation loader: CVAT-style track XML -> pedestrian trajectories

use crate::error::{AnnotationError, CurateError};
use crate::pipeline::types::{AnnotationRecord, BoundingBox, Trajectory};
use std::fs;
use std::path::Path;
use std::str::FromStr;

const PEDESTRIAN_LABELS: [&str; 2] = ["pedestrian", "person"];

/// Case-insensitive substring match against the pedestrian label set.
pub fn is_pedestrian_label(label: &str) -> bool {
    let label = label.to_lowercase();
    PEDESTRIAN_LABELS.iter().any(|l| label.contains(l))
}

fn parse_attr<T: FromStr + Default>(
    node: roxmltree::Node,
    attribute: &'static str,
    track: usize,
) -> Result<T, AnnotationError> {
    match node.attribute(attribute) {
        None => Ok(T::default()),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AnnotationError::InvalidAttribute {
                attribute,
                value: raw.to_string(),
                track,
            }),
    }
}

/// `nan` and `inf` parse as f64 but would poison the speed comparison.
fn parse_coord(
    node: roxmltree::Node,
    attribute: &'static str,
    track: usize,
) -> Result<f64, AnnotationError> {
    let value: f64 = parse_attr(node, attribute, track)?;
    if !value.is_finite() {
        return Err(AnnotationError::InvalidAttribute {
            attribute,
            value: node.attribute(attribute).unwrap_or_default().to_string(),
            track,
        });
    }
    Ok(value)
}

fn parse_box(node: roxmltree::Node, track: usize) -> Result<BoundingBox, AnnotationError> {
    Ok(BoundingBox {
        frame: parse_attr(node, "frame", track)?,
        xtl: parse_coord(node, "xtl", track)?,
        ytl: parse_coord(node, "ytl", track)?,
        xbr: parse_coord(node, "xbr", track)?,
        ybr: parse_coord(node, "ybr", track)?,
    })
}

/// Parses an annotation document into its pedestrian trajectories.
///
/// Only `<track>` elements directly under the root are read, and only their
/// direct `<box>` children. Tracks and boxes keep document order. Missing box
/// attributes default to 0; present but unparsable ones are an error.
pub fn parse_annotation(
    xml: &str,
    sort_by_frame: bool,
) -> Result<AnnotationRecord, AnnotationError> {
    let doc = roxmltree::Document::parse(xml)?;
    let mut trajectories = Vec::new();

    let tracks = doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("track"));

    for (track_idx, track) in tracks.enumerate() {
        let label = track.attribute("label").unwrap_or("");
        if !is_pedestrian_label(label) {
            continue;
        }

        let mut points = Vec::new();
        for node in track.children().filter(|n| n.has_tag_name("box")) {
            points.push(parse_box(node, track_idx)?.to_point());
        }

        if points.is_empty() {
            tracing::debug!("Dropping empty pedestrian track {} ({})", track_idx, label);
            continue;
        }

        let mut trajectory = Trajectory::new(label, points);
        if sort_by_frame {
            trajectory.sort_by_frame();
        }
        trajectories.push(trajectory);
    }

    Ok(AnnotationRecord { trajectories })
}

/// Reads and parses one annotation file, attaching the path to any failure.
pub fn load_annotation(
    path: &Path,
    sort_by_frame: bool,
) -> Result<AnnotationRecord, CurateError> {
    fs::read_to_string(path)
        .map_err(AnnotationError::from)
        .and_then(|xml| parse_annotation(&xml, sort_by_frame))
        .map_err(|source| CurateError::AnnotationParse {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::TrajectoryPoint;

    const MIXED_LABELS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<annotations>
  <version>1.1</version>
  <meta><task><name>video_0001</name></task></meta>
  <track id="0" label="Pedestrian 1">
    <box frame="0" xtl="0" ytl="0" xbr="2" ybr="2" outside="0" occluded="0">
      <attribute name="id">0_1_2b</attribute>
    </box>
    <box frame="1" xtl="2" ytl="2" xbr="4" ybr="4" outside="0" occluded="0"/>
  </track>
  <track id="1" label="Car">
    <box frame="0" xtl="100" ytl="100" xbr="200" ybr="200"/>
  </track>
  <track id="2" label="person-occluded">
    <box frame="12" xtl="10" ytl="20" xbr="30" ybr="40"/>
  </track>
</annotations>"#;

    #[test]
    fn test_filters_labels_case_insensitively_in_order() {
        let record = parse_annotation(MIXED_LABELS, false).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.trajectories[0].label, "Pedestrian 1");
        assert_eq!(record.trajectories[1].label, "person-occluded");
        assert_eq!(
            record.trajectories[0].points,
            vec![
                TrajectoryPoint::new(0, 1.0, 1.0),
                TrajectoryPoint::new(1, 3.0, 3.0)
            ]
        );
        assert_eq!(
            record.trajectories[1].points,
            vec![TrajectoryPoint::new(12, 20.0, 30.0)]
        );
    }

    #[test]
    fn test_empty_tracks_and_other_labels_are_dropped() {
        let xml = r#"<annotations>
            <track label="pedestrian"></track>
            <track label="traffic_light"><box frame="3" xtl="0" ytl="0" xbr="1" ybr="1"/></track>
        </annotations>"#;
        let record = parse_annotation(xml, false).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_nested_tracks_are_ignored() {
        let xml = r#"<annotations>
            <meta><track label="pedestrian"><box frame="1" xtl="0" ytl="0" xbr="1" ybr="1"/></track></meta>
        </annotations>"#;
        assert!(parse_annotation(xml, false).unwrap().is_empty());
    }

    #[test]
    fn test_missing_attributes_default_to_zero() {
        let xml = r#"<annotations>
            <track label="ped"><box/></track>
            <track label="PERSON"><box xbr="4" ybr="6"/></track>
        </annotations>"#;
        let record = parse_annotation(xml, false).unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(
            record.trajectories[0].points,
            vec![TrajectoryPoint::new(0, 2.0, 3.0)]
        );
    }

    #[test]
    fn test_invalid_attribute_is_an_error() {
        let xml = r#"<annotations>
            <track label="pedestrian"><box frame="x1" xtl="0" ytl="0" xbr="1" ybr="1"/></track>
        </annotations>"#;
        match parse_annotation(xml, false) {
            Err(AnnotationError::InvalidAttribute {
                attribute, value, ..
            }) => {
                assert_eq!(attribute, "frame");
                assert_eq!(value, "x1");
            }
            other => panic!("expected invalid attribute, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_coordinate_is_an_error() {
        let xml = r#"<annotations>
            <track label="pedestrian"><box frame="1" xtl="nan" ytl="0" xbr="1" ybr="1"/></track>
        </annotations>"#;
        assert!(matches!(
            parse_annotation(xml, false),
            Err(AnnotationError::InvalidAttribute { attribute: "xtl", .. })
        ));
    }

    #[test]
    fn test_extreme_coordinates_do_not_hide_slow_track() {
        let xml = r#"<annotations>
            <track label="pedestrian">
                <box frame="0" xtl="1.7e308" ytl="0" xbr="1.7e308" ybr="0"/>
                <box frame="1" xtl="-1.7e308" ytl="0" xbr="-1.7e308" ybr="0"/>
            </track>
            <track label="pedestrian">
                <box frame="30" xtl="0" ytl="0" xbr="0" ybr="0"/>
                <box frame="31" xtl="1" ytl="0" xbr="1" ybr="0"/>
            </track>
        </annotations>"#;
        let record = parse_annotation(xml, false).unwrap();
        assert_eq!(record.trajectories[0].points[0].x, 1.7e308);

        let sel = crate::pipeline::selector::select_slowest(&record.trajectories, 2.5).unwrap();
        assert_eq!(sel.index, 1);
        assert_eq!(sel.speed, 1.0);
        assert!(sel.qualifies);
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let err = parse_annotation("<annotations><track label=\"pedestrian\">", false)
            .unwrap_err();
        assert!(matches!(err, AnnotationError::Xml(_)));
    }

    #[test]
    fn test_document_order_is_preserved_unless_sorting() {
        let xml = r#"<annotations>
            <track label="pedestrian">
                <box frame="9" xtl="0" ytl="0" xbr="0" ybr="0"/>
                <box frame="3" xtl="2" ytl="2" xbr="2" ybr="2"/>
            </track>
        </annotations>"#;
        let raw = parse_annotation(xml, false).unwrap();
        assert_eq!(raw.trajectories[0].first_frame(), Some(9));

        let sorted = parse_annotation(xml, true).unwrap();
        assert_eq!(sorted.trajectories[0].first_frame(), Some(3));
    }

    #[test]
    fn test_load_annotation_wraps_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xml");
        fs::write(&path, "not xml at all <").unwrap();

        match load_annotation(&path, false) {
            Err(CurateError::AnnotationParse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_file_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.xml");

        let err = load_annotation(&path, false).unwrap_err();
        assert!(err.to_string().contains("missing.xml"));
        match err {
            CurateError::AnnotationParse {
                path: p,
                source: AnnotationError::Io(_),
            } => assert_eq!(p, path),
            other => panic!("expected parse error with io source, got {:?}", other),
        }

        let latin1 = dir.path().join("latin1.xml");
        fs::write(&latin1, [0x3c, 0x61, 0xe9, 0x2f, 0x3e]).unwrap();
        assert!(matches!(
            load_annotation(&latin1, false),
            Err(CurateError::AnnotationParse {
                source: AnnotationError::Io(_),
                ..
            })
        ));
    }
}
