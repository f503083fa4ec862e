use smallvec::SmallVec;
use std::any::Any;

use crate::{Key, Owned};

type GroupId = usize;

/// Positional memoization storage.
///
/// Composition walks a tree of groups keyed by call-site [`Key`]s. Within a
/// group, remembered values are matched by position. A recomposition that
/// skips a group (conditional content) leaves it unvisited; end-of-group
/// trimming then removes it, dropping its slots so remembered lifecycle
/// state runs its teardown. That trim is the unmount path.
///
/// Trimmed slots are not dropped in place: their destructors may call back
/// into the composition, so they are parked in a garbage list the Composer
/// drains once the table borrow has been released.
pub(crate) struct SlotTable {
    groups: Vec<Option<Group>>,
    root: GroupId,
    frames: Vec<Frame>,
    garbage: Vec<Box<dyn Any>>,
}

struct Group {
    key: Key,
    slots: SmallVec<[Box<dyn Any>; 4]>,
    children: Vec<GroupId>,
}

impl Group {
    fn new(key: Key) -> Self {
        Self {
            key,
            slots: SmallVec::new(),
            children: Vec::new(),
        }
    }
}

struct Frame {
    group: GroupId,
    child_cursor: usize,
    slot_cursor: usize,
}

impl SlotTable {
    pub(crate) fn new() -> Self {
        Self {
            groups: vec![Some(Group::new(0))],
            root: 0,
            frames: Vec::new(),
            garbage: Vec::new(),
        }
    }

    /// Rewind all cursors for a new composition pass over the whole table.
    pub(crate) fn reset(&mut self) {
        self.frames.clear();
        self.frames.push(Frame {
            group: self.root,
            child_cursor: 0,
            slot_cursor: 0,
        });
    }

    fn current_frame(&mut self) -> &mut Frame {
        self.frames
            .last_mut()
            .expect("slot table used outside a composition pass")
    }

    fn alloc_group(&mut self, key: Key) -> GroupId {
        let group = Group::new(key);
        if let Some(id) = self.groups.iter().position(Option::is_none) {
            self.groups[id] = Some(group);
            id
        } else {
            self.groups.push(Some(group));
            self.groups.len() - 1
        }
    }

    /// Enter the child group for `key`, reusing a prior-pass group when one
    /// with the same key is still ahead of the cursor.
    pub(crate) fn begin_group(&mut self, key: Key) {
        let (parent, cursor) = {
            let frame = self.current_frame();
            (frame.group, frame.child_cursor)
        };

        let matched = {
            let groups = &self.groups;
            let children = &groups[parent]
                .as_ref()
                .expect("slot group freed while in use")
                .children;
            children[cursor..]
                .iter()
                .position(|&id| {
                    groups[id]
                        .as_ref()
                        .map(|group| group.key == key)
                        .unwrap_or(false)
                })
                .map(|offset| cursor + offset)
        };

        let child = match matched {
            Some(index) => {
                let children = &mut self.groups[parent]
                    .as_mut()
                    .expect("slot group freed while in use")
                    .children;
                let id = children.remove(index);
                children.insert(cursor, id);
                id
            }
            None => {
                let id = self.alloc_group(key);
                self.groups[parent]
                    .as_mut()
                    .expect("slot group freed while in use")
                    .children
                    .insert(cursor, id);
                id
            }
        };

        self.current_frame().child_cursor += 1;
        self.frames.push(Frame {
            group: child,
            child_cursor: 0,
            slot_cursor: 0,
        });
    }

    /// Leave the current group, trimming everything its pass did not visit.
    pub(crate) fn end_group(&mut self) {
        let frame = self
            .frames
            .pop()
            .expect("end_group without matching begin_group");
        self.trim_group(frame.group, frame.child_cursor, frame.slot_cursor);
    }

    /// Close the root after a full pass; content rendered in earlier passes
    /// but not in this one is trimmed exactly like any nested group.
    pub(crate) fn finish(&mut self) {
        while let Some(frame) = self.frames.pop() {
            self.trim_group(frame.group, frame.child_cursor, frame.slot_cursor);
        }
    }

    fn trim_group(&mut self, id: GroupId, keep_children: usize, keep_slots: usize) {
        let stale: Vec<GroupId> = self.groups[id]
            .as_mut()
            .expect("slot group freed while in use")
            .children
            .split_off(keep_children);
        for child in stale {
            self.free_group(child);
        }

        let trimmed: Vec<Box<dyn Any>> = self.groups[id]
            .as_mut()
            .expect("slot group freed while in use")
            .slots
            .drain(keep_slots..)
            .collect();
        self.garbage.extend(trimmed);
    }

    fn free_group(&mut self, id: GroupId) {
        let Some(group) = self.groups[id].take() else {
            return;
        };
        for slot in group.slots {
            self.garbage.push(slot);
        }
        for child in group.children {
            self.free_group(child);
        }
    }

    /// Reuse or create the remembered value at the current slot position.
    pub(crate) fn remember<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Owned<T> {
        let (gid, cursor) = {
            let frame = self.current_frame();
            (frame.group, frame.slot_cursor)
        };

        let reused = self.groups[gid]
            .as_ref()
            .expect("slot group freed while in use")
            .slots
            .get(cursor)
            .and_then(|slot| slot.downcast_ref::<Owned<T>>())
            .cloned();

        let owned = match reused {
            Some(owned) => owned,
            None => {
                let owned = Owned::new(init());
                let boxed: Box<dyn Any> = Box::new(owned.clone());
                let replaced = {
                    let group = self.groups[gid]
                        .as_mut()
                        .expect("slot group freed while in use");
                    if cursor < group.slots.len() {
                        // Same position, different type: the call structure
                        // changed without a key change. Replace the slot.
                        Some(std::mem::replace(&mut group.slots[cursor], boxed))
                    } else {
                        group.slots.push(boxed);
                        None
                    }
                };
                if let Some(old) = replaced {
                    self.garbage.push(old);
                }
                owned
            }
        };

        self.current_frame().slot_cursor += 1;
        owned
    }

    /// Drain slots trimmed since the last call. The caller drops them after
    /// releasing its borrow of the table.
    pub(crate) fn take_garbage(&mut self) -> Vec<Box<dyn Any>> {
        std::mem::take(&mut self.garbage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct DropProbe {
        drops: Rc<Cell<usize>>,
    }

    impl Drop for DropProbe {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn pass(table: &mut SlotTable, content: impl FnOnce(&mut SlotTable)) {
        table.reset();
        content(table);
        table.finish();
    }

    #[test]
    fn remember_reuses_value_across_passes() {
        let mut table = SlotTable::new();
        let first = {
            let mut captured = None;
            pass(&mut table, |table| {
                table.begin_group(1);
                captured = Some(table.remember(|| 41u32));
                table.end_group();
            });
            captured.unwrap()
        };
        first.replace(42);

        let mut second = None;
        pass(&mut table, |table| {
            table.begin_group(1);
            second = Some(table.remember(|| 0u32));
            table.end_group();
        });

        assert_eq!(second.unwrap().with(|value| *value), 42);
        assert!(table.take_garbage().is_empty());
    }

    #[test]
    fn unvisited_group_is_trimmed_and_slots_dropped() {
        let drops = Rc::new(Cell::new(0));
        let mut table = SlotTable::new();

        let drops_in = drops.clone();
        pass(&mut table, |table| {
            table.begin_group(7);
            table.remember(move || DropProbe { drops: drops_in });
            table.end_group();
        });
        drop(table.take_garbage());
        assert_eq!(drops.get(), 0);

        // Next pass skips group 7 entirely.
        pass(&mut table, |_table| {});
        drop(table.take_garbage());
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn sibling_reorder_by_key_keeps_identity() {
        let mut table = SlotTable::new();

        let mut a1 = None;
        pass(&mut table, |table| {
            table.begin_group(1);
            a1 = Some(table.remember(|| "a"));
            table.end_group();
            table.begin_group(2);
            table.remember(|| "b");
            table.end_group();
        });
        a1.unwrap().replace("a-touched");

        // Only the second sibling remains; it must keep its own slot while
        // the first sibling's slot is reclaimed.
        let mut b = None;
        pass(&mut table, |table| {
            table.begin_group(2);
            b = Some(table.remember(|| "fresh"));
            table.end_group();
        });
        assert_eq!(b.unwrap().with(|value| *value), "b");
        assert_eq!(table.take_garbage().len(), 1);
    }

    #[test]
    fn type_change_replaces_slot() {
        let drops = Rc::new(Cell::new(0));
        let mut table = SlotTable::new();

        let drops_in = drops.clone();
        pass(&mut table, |table| {
            table.begin_group(3);
            table.remember(move || DropProbe { drops: drops_in });
            table.end_group();
        });

        let mut replaced = None;
        pass(&mut table, |table| {
            table.begin_group(3);
            replaced = Some(table.remember(|| 5u8));
            table.end_group();
        });
        drop(table.take_garbage());

        assert_eq!(drops.get(), 1);
        assert_eq!(replaced.unwrap().with(|value| *value), 5);
    }

    #[test]
    fn trailing_slots_are_truncated() {
        let drops = Rc::new(Cell::new(0));
        let mut table = SlotTable::new();

        let drops_in = drops.clone();
        pass(&mut table, |table| {
            table.begin_group(4);
            table.remember(|| 1u8);
            table.remember(move || DropProbe { drops: drops_in });
            table.end_group();
        });

        pass(&mut table, |table| {
            table.begin_group(4);
            table.remember(|| 1u8);
            table.end_group();
        });
        drop(table.take_garbage());
        assert_eq!(drops.get(), 1);
    }
}
