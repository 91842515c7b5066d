/// A forest of disjoint sets over the elements `0..len`, used to track which
/// rooms are already joined by corridors.
#[derive(Debug)]
pub struct DisjointSets {
	parents: Vec<usize>,
	sizes: Vec<usize>,
}

impl DisjointSets {
	/// Initializes a forest of `len` singleton sets.
	pub fn new(len: usize) -> DisjointSets {
		DisjointSets {
			parents: (0..len).collect(),
			sizes: vec![1; len],
		}
	}

	/// Finds the representative element of the set containing `i`, halving
	/// the path along the way.
	pub fn find(&mut self, mut i: usize) -> usize {
		while self.parents[i] != i {
			self.parents[i] = self.parents[self.parents[i]];
			i = self.parents[i];
		}
		i
	}

	/// Whether `i` and `j` are in the same set.
	pub fn connected(&mut self, i: usize, j: usize) -> bool {
		self.find(i) == self.find(j)
	}

	/// The number of elements in the set containing `i`.
	pub fn size_of(&mut self, i: usize) -> usize {
		let root = self.find(i);
		self.sizes[root]
	}

	/// Merges the sets containing `i` and `j`, returning the size of the
	/// merged set.
	pub fn merge(&mut self, i: usize, j: usize) -> usize {
		let (mut big, mut small) = (self.find(i), self.find(j));
		if big == small {
			return self.sizes[big];
		}
		if self.sizes[big] < self.sizes[small] {
			(big, small) = (small, big);
		}
		self.parents[small] = big;
		self.sizes[big] += self.sizes[small];
		self.sizes[big]
	}
}
