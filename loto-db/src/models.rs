use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub date: NaiveDate,
    pub balls: [u8; 5],
    pub chance: u8,
}

impl Draw {
    pub fn new(date: NaiveDate, balls: [u8; 5], chance: u8) -> Self {
        Self { date, balls, chance }
    }

    pub fn contains(&self, pool: Pool, number: u8) -> bool {
        pool.numbers_from(self).contains(&number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Balls,
    Chance,
}

impl Pool {
    pub fn size(&self) -> usize {
        match self {
            Pool::Balls => 49,
            Pool::Chance => 10,
        }
    }

    pub fn pick_count(&self) -> usize {
        match self {
            Pool::Balls => 5,
            Pool::Chance => 1,
        }
    }

    /// Numbers strictly above this value count as "high".
    pub fn midpoint(&self) -> u8 {
        match self {
            Pool::Balls => 25,
            Pool::Chance => 5,
        }
    }

    pub fn contains(&self, number: u8) -> bool {
        number >= 1 && number as usize <= self.size()
    }

    pub fn numbers_from<'a>(&self, draw: &'a Draw) -> &'a [u8] {
        match self {
            Pool::Balls => &draw.balls,
            Pool::Chance => std::slice::from_ref(&draw.chance),
        }
    }
}

pub fn validate_draw(balls: &[u8; 5], chance: u8) -> Result<()> {
    for &b in balls {
        if !Pool::Balls.contains(b) {
            bail!("Boule {} hors limites (1-49)", b);
        }
    }
    if !Pool::Chance.contains(chance) {
        bail!("Numéro chance {} hors limites (1-10)", chance);
    }
    for i in 0..balls.len() {
        for j in (i + 1)..balls.len() {
            if balls[i] == balls[j] {
                bail!("Boule en double : {}", balls[i]);
            }
        }
    }
    Ok(())
}
