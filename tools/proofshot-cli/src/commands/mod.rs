pub mod check;
pub mod monitors;
pub mod record;
pub mod shot;

use proofshot_capture_engine::BackendKind;
use proofshot_platform_core::Region;

/// Parse an optional backend name (case-insensitive).
pub fn parse_backend(name: Option<String>) -> anyhow::Result<Option<BackendKind>> {
    name.map(|n| n.parse::<BackendKind>().map_err(Into::into))
        .transpose()
}

/// Parse a "left,top,width,height" region argument.
pub fn parse_region(s: &str) -> anyhow::Result<Region> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [left, top, width, height] = parts.as_slice() else {
        anyhow::bail!("region must be 'left,top,width,height', got '{s}'");
    };
    Ok(Region {
        left: left.parse()?,
        top: top.parse()?,
        width: width.parse()?,
        height: height.parse()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_argument_parses_four_fields() {
        let region = parse_region("10, 20, 300, 400").unwrap();
        assert_eq!(region.left, 10);
        assert_eq!(region.top, 20);
        assert_eq!(region.width, 300);
        assert_eq!(region.height, 400);
    }

    #[test]
    fn malformed_region_arguments_fail() {
        assert!(parse_region("10,20,300").is_err());
        assert!(parse_region("a,b,c,d").is_err());
    }
}
