//! Scaling transform between raster ("size") space and a floating-point
//! working area.

use super::SizeHW;
use crate::geom::{Area, Span, Spot};

/// Behavior for area spots landing outside the area bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    /// Out-of-area data maps to the null spot.
    Clip,
    /// Out-of-area data wraps back into the area.
    Wrap,
}

/// 2-D scaling between grid index space [0,H)x[0,W) and an arbitrary Area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapSizeArea {
    size_area: Area,
    area: Area,
    edge_mode: EdgeMode,
}

impl MapSizeArea {
    pub fn new(hw: SizeHW, area: Area, edge_mode: EdgeMode) -> Self {
        let size_area = Area::new(
            Span::new(0., hw.high as f64),
            Span::new(0., hw.wide as f64),
        );
        Self {
            size_area,
            area,
            edge_mode,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.size_area.is_valid() && self.area.is_valid()
    }

    /// Area spot for a grid-space spot; null outside the grid.
    pub fn area_spot_for_grid_spot(&self, grid_spot: Spot) -> Spot {
        if !self.size_area.contains(grid_spot) {
            return Spot::NULL;
        }
        let dyad = self.size_area.fraction_dyad_at_spot(grid_spot);
        self.area.spot_at_fraction_dyad(dyad)
    }

    /// Grid spot for an area-space spot, honoring the edge mode.
    pub fn grid_spot_for_area_spot(&self, area_spot: Spot) -> Spot {
        let dyad = self.area.fraction_dyad_at_spot(area_spot);
        match self.edge_mode {
            EdgeMode::Clip => {
                if self.area.contains(area_spot) {
                    self.size_area.spot_at_fraction_dyad(dyad)
                } else {
                    Spot::NULL
                }
            }
            EdgeMode::Wrap => {
                let wrapped = Area::principal_fraction_dyad(dyad);
                self.size_area.spot_at_fraction_dyad(wrapped)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> MapSizeArea {
        MapSizeArea::new(
            SizeHW::new(10, 20),
            Area::new(Span::new(-1., 1.), Span::new(0., 4.)),
            EdgeMode::Clip,
        )
    }

    #[test]
    fn grid_area_round_trip_stays_within_a_cell() {
        // mapping into the area and back moves a spot by less than a cell
        let map = map();
        for row in 0..10 {
            for col in 0..20 {
                let spot = Spot::new(row as f64 + 0.25, col as f64 + 0.5);
                let area_spot = map.area_spot_for_grid_spot(spot);
                assert!(area_spot.is_valid());
                let back = map.grid_spot_for_area_spot(area_spot);
                assert!((back.row - spot.row).abs() < 1.);
                assert!((back.col - spot.col).abs() < 1.);
            }
        }
    }

    #[test]
    fn clip_mode_rejects_outside_area() {
        let map = map();
        assert!(!map.grid_spot_for_area_spot(Spot::new(1.5, 2.)).is_valid());
        assert!(!map.area_spot_for_grid_spot(Spot::new(10., 0.)).is_valid());
    }

    #[test]
    fn wrap_mode_folds_back_in() {
        let map = MapSizeArea::new(
            SizeHW::new(4, 4),
            Area::new(Span::new(0., 1.), Span::new(0., 1.)),
            EdgeMode::Wrap,
        );
        let spot = map.grid_spot_for_area_spot(Spot::new(1.25, -0.25));
        assert!(spot.is_valid());
        assert!((spot.row - 1.).abs() < 1e-9);
        assert!((spot.col - 3.).abs() < 1e-9);
    }
}
