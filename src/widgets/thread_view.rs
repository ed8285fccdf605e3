//! Scrolling list of multi-line comment items.
//!
//! Items are cut at the viewport edges instead of being skipped, and the
//! scroll position is kept between frames: it only moves as far as needed to
//! bring the selected item into view, preferring the item's first line.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, StatefulWidget, Widget},
};

/// Selection and line offset of a [`ThreadView`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ThreadViewState {
    selected: Option<usize>,
    offset: usize,
}

impl ThreadViewState {
    pub const fn select(&mut self, index: Option<usize>) {
        self.selected = index;
    }

    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// First rendered line, counted from the top of the first item.
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

/// One comment, already laid out into lines.
pub struct ThreadItem<'a> {
    lines: Vec<Line<'a>>,
}

impl<'a> ThreadItem<'a> {
    pub const fn new(lines: Vec<Line<'a>>) -> Self {
        Self { lines }
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }
}

pub struct ThreadView<'a> {
    items: Vec<ThreadItem<'a>>,
    block: Option<Block<'a>>,
    highlight_style: Style,
    highlight_symbol: &'a str,
}

impl<'a> ThreadView<'a> {
    pub fn new(items: Vec<ThreadItem<'a>>) -> Self {
        Self {
            items,
            block: None,
            highlight_style: Style::default(),
            highlight_symbol: "",
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub const fn highlight_style(mut self, style: Style) -> Self {
        self.highlight_style = style;
        self
    }

    pub const fn highlight_symbol(mut self, symbol: &'a str) -> Self {
        self.highlight_symbol = symbol;
        self
    }
}

impl StatefulWidget for ThreadView<'_> {
    type State = ThreadViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let inner = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        if inner.width == 0 || inner.height == 0 || self.items.is_empty() {
            return;
        }

        let heights: Vec<usize> = self.items.iter().map(ThreadItem::height).collect();
        state.offset = scroll_offset(state.offset, state.selected, &heights, inner.height as usize);

        let symbol_width = self.highlight_symbol.chars().count() as u16;
        let content_x = inner.left() + symbol_width;
        let content_width = inner.width.saturating_sub(symbol_width);
        let mut current_line = 0;
        let mut y = inner.top();

        for (item_idx, item) in self.items.iter().enumerate() {
            let is_selected = state.selected == Some(item_idx);
            for (line_idx, line) in item.lines.iter().enumerate() {
                if current_line < state.offset {
                    current_line += 1;
                    continue;
                }
                if y >= inner.bottom() {
                    return;
                }
                if is_selected {
                    buf.set_style(Rect::new(inner.left(), y, inner.width, 1), self.highlight_style);
                    if line_idx == 0 {
                        buf.set_string(inner.left(), y, self.highlight_symbol, Style::default());
                    }
                }
                buf.set_line(content_x, y, line, content_width);
                y += 1;
                current_line += 1;
            }
        }
    }
}

/// Smallest change to `current` that shows the selected item. An item taller
/// than the viewport is shown from its first line, which also brings back the
/// top of an item that was scrolled above the viewport.
pub fn scroll_offset(
    current: usize,
    selected: Option<usize>,
    heights: &[usize],
    viewport: usize,
) -> usize {
    let total: usize = heights.iter().sum();
    let max_offset = total.saturating_sub(viewport);
    let Some(selected) = selected.filter(|&s| s < heights.len()) else {
        return current.min(max_offset);
    };
    let start: usize = heights[..selected].iter().sum();
    let end = start + heights[selected];

    let offset = if start < current {
        start
    } else if end > current + viewport {
        start.min(end - viewport)
    } else {
        current
    };
    offset.min(max_offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_scroll_when_everything_fits() {
        let heights = vec![3, 3, 3];
        assert_eq!(scroll_offset(0, Some(2), &heights, 20), 0);
    }

    #[test]
    fn test_scrolls_down_just_enough() {
        let heights = vec![5, 5, 5, 5, 5];
        // Item 2 spans lines 10..15, viewport 10: its end must be visible
        assert_eq!(scroll_offset(0, Some(2), &heights, 10), 5);
        // Already visible: no movement
        assert_eq!(scroll_offset(5, Some(1), &heights, 10), 5);
    }

    #[test]
    fn test_scrolls_up_to_item_start() {
        let heights = vec![5, 5, 5, 5, 5];
        assert_eq!(scroll_offset(12, Some(1), &heights, 10), 5);
    }

    #[test]
    fn test_tall_item_shows_its_top() {
        let heights = vec![2, 30, 2];
        assert_eq!(scroll_offset(0, Some(1), &heights, 10), 2);
    }

    #[test]
    fn test_item_scrolled_above_is_restored() {
        // Focus stays on a long item whose top was scrolled away, and the
        // thread below it shrank after a collapse.
        let heights = vec![2, 30, 2];
        assert_eq!(scroll_offset(20, Some(1), &heights, 10), 2);
    }

    #[test]
    fn test_offset_clamped_when_content_shrinks() {
        let heights = vec![3, 3];
        assert_eq!(scroll_offset(40, None, &heights, 4), 2);
    }

    #[test]
    fn test_render_cuts_items_at_the_edge() {
        let items = vec![
            ThreadItem::new(vec![Line::from("a1"), Line::from("a2")]),
            ThreadItem::new(vec![Line::from("b1"), Line::from("b2")]),
        ];
        let area = Rect::new(0, 0, 6, 3);
        let mut buf = Buffer::empty(area);
        let mut state = ThreadViewState::default();
        state.select(Some(1));
        ThreadView::new(items)
            .highlight_symbol("> ")
            .render(area, &mut buf, &mut state);

        assert_eq!(state.offset(), 1);
        let row = |y: u16| -> String {
            (0..area.width)
                .map(|x| buf[(x, y)].symbol().to_string())
                .collect()
        };
        assert_eq!(row(0), "  a2  ");
        assert_eq!(row(1), "> b1  ");
        assert_eq!(row(2), "  b2  ");
    }
}
