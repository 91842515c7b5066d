use std::collections::{hash_map::Entry, HashMap, VecDeque};

use crate::geometry::{TilePoint, NEIGHBOR_OFFSETS_FOUR};

/// Walking distances from a set of source tiles to every reachable tile.
/// Based on [Dijkstra Maps Visualized][1].
///
/// [1]: https://www.roguebasin.com/index.php/Dijkstra_Maps_Visualized
#[derive(Debug)]
pub struct DijkstraMap {
	distances: HashMap<TilePoint, u32>,
}

impl DijkstraMap {
	/// Floods outward from `sources`, never entering tiles where
	/// `is_blocking` returns true.
	pub fn new(
		sources: impl IntoIterator<Item = TilePoint>,
		is_blocking: impl Fn(TilePoint) -> bool,
	) -> DijkstraMap {
		let mut distances = HashMap::new();
		let mut queue = VecDeque::new();
		for coords in sources {
			if distances.insert(coords, 0).is_none() {
				queue.push_back((coords, 0));
			}
		}
		while let Some((coords, distance)) = queue.pop_front() {
			for offset in NEIGHBOR_OFFSETS_FOUR {
				let neighbor = coords + offset;
				if is_blocking(neighbor) {
					continue;
				}
				if let Entry::Vacant(entry) = distances.entry(neighbor) {
					// Breadth-first, so tiles are reached in ascending order
					// of distance.
					entry.insert(distance + 1);
					queue.push_back((neighbor, distance + 1));
				}
			}
		}
		DijkstraMap { distances }
	}

	/// The distance from the nearest source to `coords`, or `None` if it
	/// can't be reached.
	pub fn distance(&self, coords: TilePoint) -> Option<u32> {
		self.distances.get(&coords).copied()
	}

	pub fn is_reachable(&self, coords: TilePoint) -> bool {
		self.distances.contains_key(&coords)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_distances_route_around_walls() {
		// A wall at x == 1 for y in 0..=2, open below.
		let is_blocking = |coords: TilePoint| {
			!(0..=3).contains(&coords.x)
				|| !(0..=3).contains(&coords.y)
				|| (coords.x == 1 && coords.y <= 2)
		};
		let map = DijkstraMap::new([TilePoint::new(0, 0)], is_blocking);
		assert_eq!(map.distance(TilePoint::new(0, 0)), Some(0));
		assert_eq!(map.distance(TilePoint::new(0, 3)), Some(3));
		assert_eq!(map.distance(TilePoint::new(2, 0)), Some(8));
		assert_eq!(map.distance(TilePoint::new(1, 1)), None);
		assert!(!map.is_reachable(TilePoint::new(5, 5)));
	}
}
