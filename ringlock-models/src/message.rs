// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The unit of data exchanged between ring nodes.

use std::fmt::Display;
use std::rc::Rc;

use ringlock_engine::traits::SimObject;
use ringlock_track::entity::Entity;
use ringlock_track::id::Unique;
use ringlock_track::{Id, create, create_id};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    id: Id,
    source: usize,
    dest: usize,
    /// Sequence number within the messages created by `source`
    seq: u64,
    /// Tick of the creating node at which the message was created
    created_tick: u64,
    hops: usize,
}

impl Message {
    #[must_use]
    pub fn new(
        created_by: &Rc<Entity>,
        source: usize,
        dest: usize,
        seq: u64,
        created_tick: u64,
    ) -> Self {
        let message = Self {
            id: create_id!(created_by),
            source,
            dest,
            seq,
            created_tick,
            hops: 0,
        };
        create!(created_by ; message);
        message
    }

    /// The copy that is sent on to the next node.
    #[must_use]
    pub fn forwarded(mut self) -> Self {
        self.hops += 1;
        self
    }

    #[must_use]
    pub fn source(&self) -> usize {
        self.source
    }

    #[must_use]
    pub fn dest(&self) -> usize {
        self.dest
    }

    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn created_tick(&self) -> u64 {
        self.created_tick
    }

    #[must_use]
    pub fn hops(&self) -> usize {
        self.hops
    }
}

impl SimObject for Message {}

impl Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "msg {} -> {} #{} ({} hops)",
            self.source, self.dest, self.seq, self.hops
        )
    }
}

impl Unique for Message {
    fn id(&self) -> Id {
        self.id
    }
}
