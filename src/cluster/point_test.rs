#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_valid_coordinates() {
        assert!(Point::new("a", 59.955982, 30.244759, "f").has_valid_coordinates());
        assert!(Point::new("edge", -90.0, 180.0, "f").has_valid_coordinates());
        assert!(!Point::new("nan", f64::NAN, 30.0, "f").has_valid_coordinates());
        assert!(!Point::new("inf", 10.0, f64::INFINITY, "f").has_valid_coordinates());
        assert!(!Point::new("lat", 90.5, 30.0, "f").has_valid_coordinates());
        assert!(!Point::new("lon", 10.0, -180.1, "f").has_valid_coordinates());
    }

    #[test]
    fn test_bounds_degenerate() {
        assert_eq!(Bounds::new(30.0, 59.0, 31.0, 60.0).east, 31.0);
        assert!(!Bounds::new(30.0, 59.0, 31.0, 60.0).is_degenerate());
        assert!(!Bounds::WORLD.is_degenerate());
        assert!(Bounds::ZERO.is_degenerate());
    }

    #[test]
    fn test_viewport_bounds() {
        let v = Viewport::new(Bounds::new(-74.1, 40.6, -73.9, 40.8), -1.0);
        assert_eq!(v.zoom, 0.0);
        assert_eq!(v.bounds(), Bounds::new(-74.1, 40.6, -73.9, 40.8));
    }
}
