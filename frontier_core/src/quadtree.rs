//! Region quadtree.
//!
//! Nodes hold at most one planet each. Higher priority planets settle at
//! shallower nodes so coarse levels of detail show the most important ones.
//! Regions consolidate bottom-up once all four children agree.

use std::collections::{HashSet, VecDeque};

use crate::sector::{Coordinate, PlanetRef, RegionKind, Sector};

pub const MAX_DEPTH: usize = 32;
pub const EMPTY_WEIGHT: i32 = i32::MAX;

/// Half-open integer square `[min, min + size)` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aabb {
    pub min_x: i64,
    pub min_y: i64,
    pub size: i64,
}

impl Aabb {
    pub fn new(min_x: i64, min_y: i64, size: i64) -> Self {
        Self { min_x, min_y, size }
    }

    /// Smallest power-of-two square centred on the origin that holds every
    /// coordinate strictly inside `radius`.
    pub fn covering_radius(radius: i32) -> Self {
        let span = (2 * radius.max(1) as i64) as u64;
        let size = span.next_power_of_two() as i64;
        Self::new(-size / 2, -size / 2, size)
    }

    pub fn contains(&self, position: Coordinate) -> bool {
        let (x, y) = (position.x as i64, position.y as i64);
        x >= self.min_x && x < self.min_x + self.size && y >= self.min_y && y < self.min_y + self.size
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min_x < other.min_x + other.size
            && other.min_x < self.min_x + self.size
            && self.min_y < other.min_y + other.size
            && other.min_y < self.min_y + self.size
    }

    /// NE, NW, SW, SE.
    fn quadrants(&self) -> [Aabb; 4] {
        let half = self.size / 2;
        let (cx, cy) = (self.min_x + half, self.min_y + half);
        [
            Aabb::new(cx, cy, half),
            Aabb::new(self.min_x, cy, half),
            Aabb::new(self.min_x, self.min_y, half),
            Aabb::new(cx, self.min_y, half),
        ]
    }

    fn quadrant_of(&self, position: Coordinate) -> Option<usize> {
        self.quadrants()
            .iter()
            .position(|quadrant| quadrant.contains(position))
    }
}

/// A planet placed at a quadtree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    pub position: Coordinate,
    pub planet: PlanetRef,
}

impl Occupant {
    /// Lower wins. An empty slot weighs [`EMPTY_WEIGHT`].
    pub fn weight(&self) -> i32 {
        EMPTY_WEIGHT - 1 - self.planet.tier as i32
    }
}

#[derive(Debug, Clone)]
pub struct QuadtreeNode {
    aabb: Aabb,
    region: RegionKind,
    occupant: Option<Occupant>,
    children: Option<Box<[QuadtreeNode; 4]>>,
    complete: bool,
    consolidated: bool,
}

impl QuadtreeNode {
    fn new(aabb: Aabb) -> Self {
        Self {
            aabb,
            region: RegionKind::DarkSpace,
            occupant: None,
            children: None,
            complete: false,
            consolidated: false,
        }
    }

    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    pub fn region(&self) -> RegionKind {
        self.region
    }

    pub fn occupant(&self) -> Option<&Occupant> {
        self.occupant.as_ref()
    }

    pub fn children(&self) -> Option<&[QuadtreeNode; 4]> {
        self.children.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_consolidated(&self) -> bool {
        self.consolidated
    }

    /// The node slot viewed as a sector at the node's minimum corner, or at
    /// the occupant's position when a planet is held.
    pub fn sector(&self) -> Sector {
        let position = self.occupant.map_or_else(
            || Coordinate::new(self.aabb.min_x as i32, self.aabb.min_y as i32),
            |occupant| occupant.position,
        );
        Sector {
            position,
            region: self.region,
            planet: self.occupant.map(|occupant| occupant.planet),
            explored: self.complete || self.consolidated,
        }
    }

    fn is_unit(&self) -> bool {
        self.aabb.size == 1
    }

    fn insert(&mut self, sector: &Sector, carried: Option<Occupant>, depth: usize) {
        debug_assert!(depth < MAX_DEPTH, "quadtree depth {depth} exceeds {MAX_DEPTH}");
        if self.region == RegionKind::DarkSpace {
            self.region = RegionKind::Blank;
        }

        let loser = carried.and_then(|incoming| self.settle(incoming));
        if self.is_unit() {
            if let Some(loser) = loser {
                drop_conflict(loser);
            }
            self.commit(sector.region);
        } else {
            // A displaced planet follows the sector only while both share a quadrant.
            let mut along = None;
            if let Some(loser) = loser {
                if self.aabb.quadrant_of(loser.position) == self.aabb.quadrant_of(sector.position) {
                    along = Some(loser);
                } else {
                    self.push_down(loser);
                }
            }
            if let Some(child) = self.child_mut(sector.position) {
                child.insert(sector, along, depth + 1);
            }
        }

        self.try_consolidate();
    }

    /// Offers `incoming` the slot and returns whichever planet lost it.
    fn settle(&mut self, incoming: Occupant) -> Option<Occupant> {
        match self.occupant {
            None => {
                self.occupant = Some(incoming);
                None
            }
            Some(current) if current.weight() > incoming.weight() => {
                self.occupant = Some(incoming);
                Some(current)
            }
            Some(_) => Some(incoming),
        }
    }

    /// Moves a displaced planet into the child covering its position,
    /// cascading further displacements downward.
    fn push_down(&mut self, occupant: Occupant) {
        let Some(child) = self.child_mut(occupant.position) else {
            return;
        };
        if let Some(loser) = child.settle(occupant) {
            if child.is_unit() {
                drop_conflict(loser);
            } else {
                child.push_down(loser);
            }
        }
    }

    fn commit(&mut self, region: RegionKind) {
        self.region = region;
        self.complete = true;
    }

    /// Child covering `position`, subdividing on demand. Children recreated
    /// under a consolidated node inherit its region.
    fn child_mut(&mut self, position: Coordinate) -> Option<&mut QuadtreeNode> {
        let aabb = self.aabb;
        let inherited = self.consolidated.then_some(self.region);
        let index = aabb.quadrant_of(position)?;
        let children = self.children.get_or_insert_with(|| {
            Box::new(aabb.quadrants().map(|quadrant| {
                let mut child = QuadtreeNode::new(quadrant);
                if let Some(region) = inherited {
                    child.region = region;
                    child.consolidated = true;
                }
                child
            }))
        });
        Some(&mut children[index])
    }

    fn try_consolidate(&mut self) {
        if self.complete || self.consolidated {
            return;
        }
        let Some(children) = self.children.as_deref() else {
            return;
        };
        let value = children[0].region;
        if value == RegionKind::Blank {
            return;
        }
        let unanimous = children
            .iter()
            .all(|child| (child.complete || child.consolidated) && child.region == value);
        if !unanimous {
            return;
        }

        self.region = value;
        self.consolidated = true;
        let prunable = children
            .iter()
            .all(|child| child.occupant.is_none() && child.children.is_none());
        if prunable {
            self.children = None;
            tracing::debug!(
                target: "frontier::quadtree",
                min_x = self.aabb.min_x,
                min_y = self.aabb.min_y,
                size = self.aabb.size,
                region = ?value,
                "quadtree.consolidated=pruned"
            );
        }
    }
}

/// Quadtree over the world square, fed with explored sectors.
#[derive(Debug, Clone)]
pub struct RegionQuadtree {
    root: QuadtreeNode,
    known: HashSet<Coordinate>,
}

impl RegionQuadtree {
    pub fn new(bounds: Aabb) -> Self {
        Self {
            root: QuadtreeNode::new(bounds),
            known: HashSet::new(),
        }
    }

    pub fn for_radius(radius: i32) -> Self {
        Self::new(Aabb::covering_radius(radius))
    }

    pub fn root(&self) -> &QuadtreeNode {
        &self.root
    }

    pub fn bounds(&self) -> Aabb {
        self.root.aabb
    }

    /// Returns false for a position inserted before or outside the bounds.
    pub fn insert(&mut self, sector: &Sector) -> bool {
        if !self.root.aabb.contains(sector.position) {
            return false;
        }
        if !self.known.insert(sector.position) {
            return false;
        }
        let carried = sector.planet.map(|planet| Occupant {
            position: sector.position,
            planet,
        });
        self.root.insert(sector, carried, 0);
        true
    }

    /// Visits nodes level by level; children are skipped when `visit`
    /// returns false.
    pub fn walk_breadth_first<F>(&self, mut visit: F)
    where
        F: FnMut(&QuadtreeNode) -> bool,
    {
        let mut queue = VecDeque::from([&self.root]);
        while let Some(node) = queue.pop_front() {
            if !visit(node) {
                continue;
            }
            if let Some(children) = node.children() {
                queue.extend(children.iter());
            }
        }
    }

    /// `pre` runs on the way down and prunes the subtree when it returns
    /// false. `post` runs on the way up until it first returns false.
    pub fn walk_depth_first<Pre, Post>(&self, mut pre: Pre, mut post: Post)
    where
        Pre: FnMut(&QuadtreeNode) -> bool,
        Post: FnMut(&QuadtreeNode) -> bool,
    {
        let mut bubbling = true;
        walk_node(&self.root, &mut pre, &mut post, &mut bubbling);
    }

    /// Visits every node whose box intersects `area`, coarse to fine.
    pub fn query<F>(&self, area: &Aabb, mut visit: F)
    where
        F: FnMut(&QuadtreeNode),
    {
        self.walk_breadth_first(|node| {
            if !node.aabb.intersects(area) {
                return false;
            }
            visit(node);
            true
        });
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk_breadth_first(|_| {
            count += 1;
            true
        });
        count
    }

    pub fn planet_count(&self) -> usize {
        let mut count = 0;
        self.walk_breadth_first(|node| {
            count += usize::from(node.occupant.is_some());
            true
        });
        count
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

fn drop_conflict(loser: Occupant) {
    tracing::warn!(
        target: "frontier::quadtree",
        x = loser.position.x,
        y = loser.position.y,
        tier = loser.planet.tier,
        "quadtree.leaf_conflict=dropped"
    );
}

fn walk_node<Pre, Post>(node: &QuadtreeNode, pre: &mut Pre, post: &mut Post, bubbling: &mut bool)
where
    Pre: FnMut(&QuadtreeNode) -> bool,
    Post: FnMut(&QuadtreeNode) -> bool,
{
    if !pre(node) {
        return;
    }
    if let Some(children) = node.children() {
        for child in children {
            walk_node(child, pre, post, bubbling);
        }
    }
    if *bubbling {
        *bubbling = post(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::LocationHash;

    fn plain(x: i32, y: i32, region: RegionKind) -> Sector {
        Sector::explored(Coordinate::new(x, y), region, None)
    }

    fn with_planet(x: i32, y: i32, tier: u8) -> Sector {
        let mut bytes = [0u8; 32];
        bytes[0] = tier;
        bytes[1] = x as u8;
        bytes[2] = y as u8;
        Sector::explored(
            Coordinate::new(x, y),
            RegionKind::Nebula,
            Some(PlanetRef {
                id: LocationHash::from_bytes(bytes),
                tier,
            }),
        )
    }

    fn ne_quadrant(tree: &RegionQuadtree) -> &QuadtreeNode {
        &tree.root().children().expect("root subdivided")[0]
    }

    #[test]
    fn bounds_cover_radius_with_power_of_two() {
        assert_eq!(Aabb::covering_radius(4), Aabb::new(-4, -4, 8));
        assert_eq!(Aabb::covering_radius(100), Aabb::new(-128, -128, 256));
        assert_eq!(
            Aabb::covering_radius(1 << 30),
            Aabb::new(-(1 << 30), -(1 << 30), 1 << 31)
        );
    }

    #[test]
    fn children_are_ordered_ne_nw_sw_se() {
        let quadrants = Aabb::new(-4, -4, 8).quadrants();
        assert!(quadrants[0].contains(Coordinate::new(1, 1)));
        assert!(quadrants[1].contains(Coordinate::new(-1, 1)));
        assert!(quadrants[2].contains(Coordinate::new(-1, -1)));
        assert!(quadrants[3].contains(Coordinate::new(1, -1)));
    }

    #[test]
    fn duplicate_and_outside_positions_are_rejected() {
        let mut tree = RegionQuadtree::for_radius(4);
        assert!(tree.insert(&plain(1, 1, RegionKind::Nebula)));
        assert!(!tree.insert(&plain(1, 1, RegionKind::DeepSpace)));
        assert!(!tree.insert(&plain(9, 0, RegionKind::Nebula)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn dense_uniform_quadrant_consolidates_and_prunes() {
        let mut tree = RegionQuadtree::for_radius(4);
        for x in 0..4 {
            for y in 0..4 {
                assert!(tree.insert(&plain(x, y, RegionKind::SafeSpace)));
            }
        }
        let quadrant = ne_quadrant(&tree);
        assert!(quadrant.is_consolidated());
        assert!(quadrant.children().is_none());
        assert_eq!(quadrant.region(), RegionKind::SafeSpace);
        assert_eq!(tree.root().region(), RegionKind::Blank);
        assert!(!tree.root().is_consolidated());
    }

    #[test]
    fn one_differing_cell_blocks_consolidation_above_it() {
        let mut tree = RegionQuadtree::for_radius(4);
        for x in 0..4 {
            for y in 0..4 {
                let region = if (x, y) == (3, 0) {
                    RegionKind::DeepSpace
                } else {
                    RegionKind::SafeSpace
                };
                tree.insert(&plain(x, y, region));
            }
        }
        let quadrant = ne_quadrant(&tree);
        assert!(!quadrant.is_consolidated());
        let children = quadrant.children().expect("children kept");
        // NE, NW and SW blocks of the quadrant are uniform
        assert!(children[0].is_consolidated());
        assert!(children[1].is_consolidated());
        assert!(children[2].is_consolidated());
        assert!(!children[3].is_consolidated());
    }

    #[test]
    fn planets_block_pruning() {
        let mut tree = RegionQuadtree::for_radius(4);
        // each planet is displaced one level deeper by the previous, stronger one
        for (x, y, tier) in [(0, 0, 3), (0, 1, 2), (1, 0, 1), (1, 1, 0)] {
            assert!(tree.insert(&with_planet(x, y, tier)));
        }
        assert_eq!(tree.planet_count(), 4);
        let block = &ne_quadrant(&tree).children().expect("quadrant subdivided")[2];
        assert_eq!(block.occupant().unwrap().planet.tier, 1);
        assert!(block.is_consolidated());
        assert_eq!(block.region(), RegionKind::Nebula);
        let leaves = block.children().expect("planet keeps children alive");
        assert_eq!(leaves[0].occupant().unwrap().planet.tier, 0);
    }

    #[test]
    fn consolidation_ignores_insert_order() {
        use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};

        let mut cells: Vec<(i32, i32)> = (-4..0).flat_map(|x| (0..4).map(move |y| (x, y))).collect();
        let mut rng = SmallRng::seed_from_u64(0x5EC7_0A11);
        for _ in 0..8 {
            cells.shuffle(&mut rng);
            let mut tree = RegionQuadtree::for_radius(4);
            for &(x, y) in &cells {
                tree.insert(&plain(x, y, RegionKind::DeepSpace));
            }
            let nw = &tree.root().children().unwrap()[1];
            assert!(nw.is_consolidated());
            assert!(nw.children().is_none());
            assert_eq!(nw.region(), RegionKind::DeepSpace);
            assert_eq!(tree.node_count(), 5);
        }
    }

    #[test]
    fn higher_tier_settles_shallower() {
        let mut tree = RegionQuadtree::for_radius(4);
        assert!(tree.insert(&with_planet(1, 1, 1)));
        assert_eq!(tree.root().occupant().unwrap().planet.tier, 1);
        assert!(tree.insert(&with_planet(-2, -3, 4)));
        let root = tree.root().occupant().unwrap();
        assert_eq!(root.planet.tier, 4);
        assert_eq!(root.position, Coordinate::new(-2, -3));
        assert_eq!(tree.planet_count(), 2);

        assert!(tree.insert(&with_planet(2, 2, 0)));
        assert_eq!(tree.root().occupant().unwrap().planet.tier, 4);
        assert_eq!(tree.planet_count(), 3);
    }

    #[test]
    fn displaced_planet_moves_into_its_own_quadrant() {
        let mut tree = RegionQuadtree::for_radius(4);
        tree.insert(&with_planet(1, 1, 1));
        tree.insert(&with_planet(-2, -3, 4));
        let children = tree.root().children().expect("root subdivided");
        let ne = children[0].occupant().expect("displaced planet");
        assert_eq!(ne.position, Coordinate::new(1, 1));
        assert!(children[2].occupant().is_none());
    }

    #[test]
    fn depth_first_orders_pre_and_post() {
        let mut tree = RegionQuadtree::for_radius(2);
        tree.insert(&plain(0, 0, RegionKind::Nebula));
        let mut pre = Vec::new();
        let mut post = Vec::new();
        tree.walk_depth_first(
            |node| {
                pre.push(node.aabb().size);
                true
            },
            |node| {
                post.push(node.aabb().size);
                true
            },
        );
        assert_eq!(pre.first(), Some(&4));
        assert_eq!(post.last(), Some(&4));
        assert_eq!(pre.len(), post.len());
        assert_eq!(tree.node_count(), pre.len());
    }

    #[test]
    fn query_visits_intersecting_nodes_only() {
        let mut tree = RegionQuadtree::for_radius(4);
        tree.insert(&plain(3, 3, RegionKind::Nebula));
        tree.insert(&plain(-4, -4, RegionKind::Nebula));
        let mut visited = Vec::new();
        tree.query(&Aabb::new(2, 2, 2), |node| visited.push(node.aabb()));
        assert!(visited.contains(&Aabb::new(3, 3, 1)));
        assert!(!visited.contains(&Aabb::new(-4, -4, 1)));
        assert!(visited.iter().all(|aabb| aabb.intersects(&Aabb::new(2, 2, 2))));
    }
}
