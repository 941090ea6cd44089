use indexmap::IndexMap;
use tracing::trace;

use crate::io::{utils::checked_len, Error, Result, RECORD_HEADER_LENGTH, SENTINEL_LENGTH};
use crate::structs::Element;

/// One structural decision of the layout plan.
///
/// Sizing and writing both walk the same sequence of steps, so the order of
/// records and the placement of sentinel blocks are decided exactly once.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Step<'a> {
    /// Record header, identifier and properties of an element.
    Open(&'a Element),
    /// A 13-byte all-zero block.
    Sentinel,
    /// End of an element's region, including its children.
    Close(&'a Element),
}

/// Derived sizes of one element for one encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementLayout {
    /// Absolute offset of the record's first byte.
    pub start_offset: u64,
    /// Absolute offset right after the record and all of its descendants.
    pub end_offset: u32,
    /// Combined length of the element's tagged properties.
    pub props_length: u32,
}

/// Layout plan for a list of sibling elements.
///
/// Built from a borrowed tree, which therefore cannot change while the plan
/// exists. Every encode builds its own plan, so offsets from a previous
/// encode are never reused.
pub struct Layout<'a> {
    steps: Vec<Step<'a>>,
    elements: IndexMap<*const Element, ElementLayout>,
    start_offset: u64,
    end_offset: u64,
}

impl<'a> Layout<'a> {
    /// Plans and measures the children of `root`, with the first record
    /// starting at `start_offset`.
    ///
    /// The root is framing only: it is treated as a non-last element whose
    /// children are written, followed by the closing sentinel.
    pub fn for_root(root: &'a Element, start_offset: u64) -> Result<Self> {
        if !root.id().is_empty() || !root.properties().is_empty() {
            return Err(Error::InvalidRoot);
        }

        let mut steps = Vec::new();
        plan_children(&mut steps, root, false)?;
        Self::measure(steps, start_offset)
    }

    /// Plans and measures a single element as if it started at
    /// `start_offset`.
    pub fn for_element(element: &'a Element, start_offset: u64, last: bool) -> Result<Self> {
        let mut steps = Vec::new();
        plan_element(&mut steps, element, last)?;
        Self::measure(steps, start_offset)
    }

    fn measure(steps: Vec<Step<'a>>, start_offset: u64) -> Result<Self> {
        let mut elements = IndexMap::new();
        let mut offset = start_offset;

        for step in steps.iter() {
            match *step {
                Step::Open(element) => {
                    let props_length: usize = element
                        .properties()
                        .iter()
                        .map(|p| p.encoded_len())
                        .sum();
                    let layout = ElementLayout {
                        start_offset: offset,
                        end_offset: 0,
                        props_length: checked_len(props_length)?,
                    };
                    offset += (RECORD_HEADER_LENGTH + 1 + element.id().len() + props_length) as u64;
                    elements.insert(element as *const Element, layout);
                }
                Step::Sentinel => offset += SENTINEL_LENGTH as u64,
                Step::Close(element) => {
                    let end = u32::try_from(offset).map_err(|_| Error::OffsetOverflow { offset })?;
                    let layout = elements
                        .get_mut(&(element as *const Element))
                        .ok_or(Error::MissingLayout)?;
                    layout.end_offset = end;
                    trace!(
                        id = %String::from_utf8_lossy(element.id()),
                        start = layout.start_offset,
                        end,
                        props_length = layout.props_length,
                        "measured element"
                    );
                }
            }
        }

        Ok(Layout {
            steps,
            elements,
            start_offset,
            end_offset: offset,
        })
    }

    pub(crate) fn steps(&self) -> &[Step<'a>] {
        &self.steps
    }

    /// Looks up the derived sizes of an element of the planned tree.
    pub fn get(&self, element: &Element) -> Option<&ElementLayout> {
        self.elements.get(&(element as *const Element))
    }

    /// Layouts of all planned elements, in record order.
    pub fn elements(&self) -> impl Iterator<Item = &ElementLayout> {
        self.elements.values()
    }

    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// Offset right after the last planned byte.
    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }

    /// Total bytes the plan will write.
    pub fn len(&self) -> u64 {
        self.end_offset - self.start_offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn plan_element<'a>(steps: &mut Vec<Step<'a>>, element: &'a Element, last: bool) -> Result<()> {
    if element.id().is_empty() && !element.is_bare() {
        return Err(Error::EmptyIdentifier);
    }

    steps.push(Step::Open(element));
    plan_children(steps, element, last)?;
    steps.push(Step::Close(element));
    Ok(())
}

fn plan_children<'a>(steps: &mut Vec<Step<'a>>, element: &'a Element, last: bool) -> Result<()> {
    let children = element.children();
    if !children.is_empty() {
        for (i, child) in children.iter().enumerate() {
            plan_element(steps, child, i == children.len() - 1)?;
        }
        steps.push(Step::Sentinel);
    } else if element.properties().is_empty() && !last {
        // Separates consecutive bare siblings.
        steps.push(Step::Sentinel);
    }
    Ok(())
}

/// Computes the offset right after `element` when it starts at
/// `start_offset`.
pub fn size(element: &Element, start_offset: u64, last: bool) -> Result<u64> {
    Ok(Layout::for_element(element, start_offset, last)?.end_offset())
}
