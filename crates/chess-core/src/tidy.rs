//! Tidy tree placement (Reingold-Tilford with per-depth contours).
//!
//! Each subtree is laid out relative to its own root, then siblings are pushed
//! apart left to right until no depth level overlaps, and the parent is
//! centred over its first and last child. Runs in O(n · height).

/// Horizontal gaps, in layout units, between neighbouring nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separation {
    /// Between nodes sharing a parent.
    pub siblings: f64,
    /// Between nodes under different parents.
    pub cousins: f64,
}

impl Default for Separation {
    fn default() -> Self {
        Self {
            siblings: 1.0,
            cousins: 1.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TidyPoint {
    /// Horizontal position in layout units, root at 0.
    pub x: f64,
    pub depth: usize,
}

/// Leftmost and rightmost offsets of a subtree at each depth, relative to the
/// subtree's root.
struct Contour {
    left: Vec<f64>,
    right: Vec<f64>,
}

impl Contour {
    fn leaf() -> Self {
        Self {
            left: vec![0.0],
            right: vec![0.0],
        }
    }
}

/// Place every node of a tree given as an adjacency list. `children[i]` lists
/// the ordered children of node `i`; node 0 is the root.
pub fn tidy_positions(children: &[Vec<usize>], separation: Separation) -> Vec<TidyPoint> {
    if children.is_empty() {
        return Vec::new();
    }

    let mut relative = vec![0.0; children.len()];
    first_walk(0, children, separation, &mut relative);

    // Second walk: accumulate relative offsets down from the root
    let mut points = vec![TidyPoint { x: 0.0, depth: 0 }; children.len()];
    let mut stack = vec![0usize];
    while let Some(v) = stack.pop() {
        for &c in &children[v] {
            points[c] = TidyPoint {
                x: points[v].x + relative[c],
                depth: points[v].depth + 1,
            };
            stack.push(c);
        }
    }

    points
}

fn first_walk(
    v: usize,
    children: &[Vec<usize>],
    separation: Separation,
    relative: &mut [f64],
) -> Contour {
    let kids = &children[v];
    if kids.is_empty() {
        return Contour::leaf();
    }

    let mut offsets: Vec<f64> = Vec::with_capacity(kids.len());
    let mut merged: Option<Contour> = None;

    for &c in kids {
        let sub = first_walk(c, children, separation, relative);

        match merged.as_mut() {
            None => {
                offsets.push(0.0);
                merged = Some(sub);
            }
            Some(acc) => {
                // Smallest offset that clears the placed siblings at every shared depth
                let offset = acc
                    .right
                    .iter()
                    .zip(&sub.left)
                    .enumerate()
                    .map(|(depth, (right, left))| {
                        let gap = if depth == 0 {
                            separation.siblings
                        } else {
                            separation.cousins
                        };
                        right + gap - left
                    })
                    .fold(f64::NEG_INFINITY, f64::max);

                for depth in 0..sub.left.len() {
                    if depth < acc.right.len() {
                        acc.right[depth] = offset + sub.right[depth];
                    } else {
                        acc.left.push(offset + sub.left[depth]);
                        acc.right.push(offset + sub.right[depth]);
                    }
                }
                offsets.push(offset);
            }
        }
    }

    let center = (offsets[0] + offsets[offsets.len() - 1]) / 2.0;
    for (&c, offset) in kids.iter().zip(&offsets) {
        relative[c] = offset - center;
    }

    let below = merged.unwrap_or_else(Contour::leaf);
    let mut contour = Contour {
        left: Vec::with_capacity(below.left.len() + 1),
        right: Vec::with_capacity(below.right.len() + 1),
    };
    contour.left.push(0.0);
    contour.right.push(0.0);
    contour.left.extend(below.left.iter().map(|x| x - center));
    contour.right.extend(below.right.iter().map(|x| x - center));
    contour
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_node() {
        let points = tidy_positions(&[vec![]], Separation::default());
        assert_eq!(points, vec![TidyPoint { x: 0.0, depth: 0 }]);
    }

    #[test]
    fn test_siblings_one_unit_apart() {
        let points = tidy_positions(&[vec![1, 2], vec![], vec![]], Separation::default());
        assert_eq!(points[1].x, -0.5);
        assert_eq!(points[2].x, 0.5);
        assert_eq!(points[1].depth, 1);
    }

    #[test]
    fn test_cousins_get_wider_gap() {
        // 0 -> (1 -> 3), (2 -> 4)
        let children = vec![vec![1, 2], vec![3], vec![4], vec![], vec![]];
        let points = tidy_positions(&children, Separation::default());
        assert_eq!(points[4].x - points[3].x, 1.25);
        assert_eq!(points[2].x - points[1].x, 1.25);
    }

    #[test]
    fn test_deep_subtrees_do_not_overlap() {
        // Left child has a wide subtree two levels down, right child is a chain.
        // 0 -> 1, 2; 1 -> 3; 3 -> 4, 5, 6; 2 -> 7; 7 -> 8
        let children = vec![
            vec![1, 2],
            vec![3],
            vec![7],
            vec![4, 5, 6],
            vec![],
            vec![],
            vec![],
            vec![8],
            vec![],
        ];
        let points = tidy_positions(&children, Separation::default());
        // Depth 3: 4, 5, 6 from the left subtree, 8 from the right one
        assert!(points[8].x - points[6].x >= 1.25 - 1e-9);
        assert!(points[1].x < points[2].x);
    }
}
