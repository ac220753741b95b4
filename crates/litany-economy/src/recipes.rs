//! Recipe catalogue.
//!
//! A [`RecipeBook`] is an ordered list of [`Recipe`]s. Declaration order is
//! load-bearing: crafting resolves a selection to the *first* unlocked recipe
//! whose inputs it satisfies, so more specific recipes are declared before
//! the general ones they overlap with.
//!
//! Recipes never change after the book is built, except for the `unlocked`
//! flag, which flips from `false` to `true` at most once.
//!
//! # Standard book
//!
//! | Recipe     | Inputs                 | Kind                         |
//! |------------|------------------------|------------------------------|
//! | Articulate | thought, sound, insight| single-cast -> word          |
//! | Contemplate| sound, insight         | single-cast -> thought       |
//! | Resonance  | word, sound            | buff, generator -> insight/s |
//! | Rumination | thought, insight       | buff, drain: insight->thought|
//! | Call       | word, thought          | buff, voice                  |
//! | Intone     | sound                  | charge                       |
//! | Murmur     | insight                | single-cast -> sound         |

use std::collections::{BTreeMap, BTreeSet};

use litany_types::{RecipeTag, Resource, SkillTag};
use serde::{Deserialize, Serialize};

use crate::error::EconomyError;
use crate::pool::{Amounts, Pools};
use crate::skills::SkillSet;

// ---------------------------------------------------------------------------
// Requirements
// ---------------------------------------------------------------------------

/// Skill-level and resource thresholds that must all hold.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Requirements {
    /// Minimum level per skill.
    #[serde(default)]
    pub skills: BTreeMap<SkillTag, u32>,
    /// Minimum current amount per resource.
    #[serde(default)]
    pub resources: BTreeMap<Resource, f64>,
}

impl Requirements {
    /// Requirement on a single skill level.
    pub fn skill(tag: SkillTag, level: u32) -> Self {
        Self {
            skills: BTreeMap::from([(tag, level)]),
            resources: BTreeMap::new(),
        }
    }

    /// Requirement on a single resource amount.
    pub fn resource(resource: Resource, amount: f64) -> Self {
        Self {
            skills: BTreeMap::new(),
            resources: BTreeMap::from([(resource, amount)]),
        }
    }

    /// Check every threshold. The error names the first unmet one.
    pub fn check(&self, pools: &Pools, skills: &SkillSet) -> Result<(), String> {
        for (tag, needed) in &self.skills {
            let have = skills.level(*tag);
            if have < *needed {
                return Err(format!("requires {tag} level {needed} (currently {have})"));
            }
        }
        for (resource, needed) in &self.resources {
            let have = pools.current(*resource);
            if have < *needed {
                return Err(format!("requires {needed:.0} {resource} (currently {have:.0})"));
            }
        }
        Ok(())
    }

    /// Whether every threshold holds.
    pub fn is_met(&self, pools: &Pools, skills: &SkillSet) -> bool {
        self.check(pools, skills).is_ok()
    }
}

// ---------------------------------------------------------------------------
// Recipe
// ---------------------------------------------------------------------------

/// A crafting rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique name.
    pub name: String,
    /// Tokens the selection must contain (resource -> count).
    pub inputs: BTreeMap<Resource, u32>,
    /// Produced immediately for single-cast recipes, or per second while a
    /// duration recipe runs.
    pub outputs: BTreeMap<Resource, u32>,
    /// Consumed per second while a duration recipe runs.
    #[serde(default)]
    pub upkeep: BTreeMap<Resource, f64>,
    /// XP granted on a successful cast, per skill before splitting.
    #[serde(default)]
    pub xp_reward: BTreeMap<SkillTag, f64>,
    /// Behavioural tags.
    #[serde(default)]
    pub tags: BTreeSet<RecipeTag>,
    /// Conditions that unlock the recipe. `None` means unlocked from the start.
    #[serde(default)]
    pub unlock_when: Option<Requirements>,
    /// Conditions checked on every cast.
    #[serde(default)]
    pub requirements: Option<Requirements>,
    /// What a cast debits. Defaults to `inputs`.
    #[serde(default)]
    pub cast_cost: Option<BTreeMap<Resource, u32>>,
    /// Buff length in seconds, for duration recipes.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Seconds before the recipe can be cast again.
    #[serde(default)]
    pub cooldown: Option<f64>,
    /// Strength of the recipe; becomes the buff multiplier.
    #[serde(default = "default_potency")]
    pub potency: f64,
    /// Casting feeds the Intone charge instead of producing outputs.
    #[serde(default)]
    pub charge: bool,
    #[serde(skip)]
    unlocked: bool,
}

const fn default_potency() -> f64 {
    1.0
}

impl Recipe {
    /// Start a recipe definition with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            upkeep: BTreeMap::new(),
            xp_reward: BTreeMap::new(),
            tags: BTreeSet::new(),
            unlock_when: None,
            requirements: None,
            cast_cost: None,
            duration: None,
            cooldown: None,
            potency: default_potency(),
            charge: false,
            unlocked: false,
        }
    }

    /// Set the selection inputs.
    #[must_use]
    pub fn inputs(mut self, inputs: impl IntoIterator<Item = (Resource, u32)>) -> Self {
        self.inputs = inputs.into_iter().collect();
        self
    }

    /// Set the outputs.
    #[must_use]
    pub fn outputs(mut self, outputs: impl IntoIterator<Item = (Resource, u32)>) -> Self {
        self.outputs = outputs.into_iter().collect();
        self
    }

    /// Set the per-second upkeep.
    #[must_use]
    pub fn upkeep(mut self, upkeep: impl IntoIterator<Item = (Resource, f64)>) -> Self {
        self.upkeep = upkeep.into_iter().collect();
        self
    }

    /// Set the XP reward.
    #[must_use]
    pub fn xp(mut self, xp: impl IntoIterator<Item = (SkillTag, f64)>) -> Self {
        self.xp_reward = xp.into_iter().collect();
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = RecipeTag>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Gate the recipe behind unlock conditions.
    #[must_use]
    pub fn unlock_when(mut self, requirements: Requirements) -> Self {
        self.unlock_when = Some(requirements);
        self
    }

    /// Require conditions on every cast.
    #[must_use]
    pub fn requires(mut self, requirements: Requirements) -> Self {
        self.requirements = Some(requirements);
        self
    }

    /// Override what a cast debits.
    #[must_use]
    pub fn cast_cost(mut self, cost: impl IntoIterator<Item = (Resource, u32)>) -> Self {
        self.cast_cost = Some(cost.into_iter().collect());
        self
    }

    /// Make this a duration recipe.
    #[must_use]
    pub const fn duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Set the cooldown.
    #[must_use]
    pub const fn cooldown(mut self, seconds: f64) -> Self {
        self.cooldown = Some(seconds);
        self
    }

    /// Set the potency.
    #[must_use]
    pub const fn potency(mut self, potency: f64) -> Self {
        self.potency = potency;
        self
    }

    /// Make casts feed the Intone charge.
    #[must_use]
    pub const fn charging(mut self) -> Self {
        self.charge = true;
        self
    }

    /// Whether the recipe has been unlocked.
    pub const fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Whether the recipe runs for a duration.
    pub const fn is_sustained(&self) -> bool {
        self.duration.is_some()
    }

    /// Whether a running instance holds a memory slot.
    pub fn occupies_slot(&self) -> bool {
        self.is_sustained() && self.tags.contains(&RecipeTag::Buff)
    }

    /// Whether the recipe carries `tag`.
    pub fn has_tag(&self, tag: RecipeTag) -> bool {
        self.tags.contains(&tag)
    }

    /// What a cast debits: the explicit cast cost, or else the inputs.
    pub fn cost(&self) -> Amounts {
        self.cast_cost
            .as_ref()
            .unwrap_or(&self.inputs)
            .iter()
            .map(|(r, n)| (*r, f64::from(*n)))
            .collect()
    }

    /// XP actually granted per skill: each listed amount split evenly across
    /// the skills listed.
    pub fn xp_shares(&self) -> impl Iterator<Item = (SkillTag, f64)> + '_ {
        let count = u32::try_from(self.xp_reward.len()).unwrap_or(u32::MAX).max(1);
        let divisor = f64::from(count);
        self.xp_reward
            .iter()
            .map(move |(skill, amount)| (*skill, amount / divisor))
    }

    /// Outputs as floating-point amounts, scaled by `factor`.
    pub fn scaled_outputs(&self, factor: f64) -> Amounts {
        self.outputs
            .iter()
            .map(|(r, n)| (*r, f64::from(*n) * factor))
            .collect()
    }

    /// Whether a selection with the given token counts satisfies every input.
    pub fn satisfied_by(&self, counts: &BTreeMap<Resource, u32>) -> bool {
        self.inputs
            .iter()
            .all(|(r, needed)| counts.get(r).copied().unwrap_or(0) >= *needed)
    }

    fn validate(&self) -> Result<(), EconomyError> {
        let invalid = |reason: &str| EconomyError::InvalidRecipe {
            recipe: self.name.clone(),
            reason: reason.to_owned(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if self.inputs.is_empty() || self.inputs.values().any(|n| *n == 0) {
            return Err(invalid("inputs must name at least one resource with a positive count"));
        }
        if let Some(d) = self.duration {
            if !d.is_finite() || d <= 0.0 {
                return Err(invalid("duration must be a positive number of seconds"));
            }
        }
        if self.has_tag(RecipeTag::Duration) != self.is_sustained() {
            return Err(invalid("the duration tag and a duration value must go together"));
        }
        if self.has_tag(RecipeTag::Buff) && !self.is_sustained() {
            return Err(invalid("buff recipes need a duration"));
        }
        if let Some(c) = self.cooldown {
            if !c.is_finite() || c < 0.0 {
                return Err(invalid("cooldown must be non-negative"));
            }
        }
        if !self.potency.is_finite() || self.potency < 0.0 {
            return Err(invalid("potency must be non-negative"));
        }
        if self.charge && self.is_sustained() {
            return Err(invalid("a charge recipe cannot also have a duration"));
        }
        if self.upkeep.values().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(invalid("upkeep amounts must be non-negative"));
        }
        if self.xp_reward.values().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(invalid("xp rewards must be non-negative"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecipeBook
// ---------------------------------------------------------------------------

/// The ordered recipe catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeBook {
    recipes: Vec<Recipe>,
}

impl RecipeBook {
    /// Build and validate a book. Recipes without unlock conditions start
    /// unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidRecipe`] for a malformed recipe and
    /// [`EconomyError::DuplicateRecipe`] for a repeated name.
    pub fn new(recipes: Vec<Recipe>) -> Result<Self, EconomyError> {
        let mut seen = BTreeSet::new();
        let mut recipes = recipes;
        for recipe in &mut recipes {
            recipe.validate()?;
            if !seen.insert(recipe.name.clone()) {
                return Err(EconomyError::DuplicateRecipe(recipe.name.clone()));
            }
            recipe.unlocked = recipe.unlock_when.is_none();
        }
        Ok(Self { recipes })
    }

    /// The standard catalogue.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature mirrors [`RecipeBook::new`].
    pub fn standard() -> Result<Self, EconomyError> {
        use RecipeTag::{Buff, Drain, Duration, Generator, SingleCast, Voice};
        use Resource::{Insight, Sound, Thought, Word};

        Self::new(vec![
            Recipe::new("Articulate")
                .inputs([(Thought, 1), (Sound, 1), (Insight, 1)])
                .cast_cost([(Thought, 2), (Sound, 2), (Insight, 40)])
                .outputs([(Word, 1)])
                .xp([(SkillTag::Speech, 24.0), (SkillTag::Reflection, 24.0)])
                .tags([SingleCast])
                .unlock_when(Requirements::resource(Thought, 3.0))
                .requires(Requirements::skill(SkillTag::Reflection, 2))
                .cooldown(3.0),
            Recipe::new("Contemplate")
                .inputs([(Sound, 1), (Insight, 1)])
                .cast_cost([(Sound, 1), (Insight, 25)])
                .outputs([(Thought, 1)])
                .xp([(SkillTag::Reflection, 8.0)])
                .tags([SingleCast])
                .cooldown(1.0),
            Recipe::new("Resonance")
                .inputs([(Word, 1), (Sound, 1)])
                .cast_cost([(Word, 1), (Sound, 3)])
                .outputs([(Insight, 2)])
                .xp([(SkillTag::Resonance, 20.0)])
                .tags([Buff, Duration, Generator])
                .unlock_when(Requirements::resource(Word, 1.0))
                .duration(30.0)
                .cooldown(45.0),
            Recipe::new("Rumination")
                .inputs([(Thought, 1), (Insight, 1)])
                .cast_cost([(Thought, 1), (Insight, 50)])
                .outputs([(Thought, 1)])
                .upkeep([(Insight, 4.0)])
                .xp([(SkillTag::Reflection, 30.0), (SkillTag::Resonance, 30.0)])
                .tags([Buff, Duration, Drain, Generator])
                .unlock_when(Requirements::skill(SkillTag::Reflection, 3))
                .duration(20.0)
                .cooldown(30.0)
                .potency(0.1),
            Recipe::new("Call")
                .inputs([(Word, 1), (Thought, 1)])
                .cast_cost([(Word, 2), (Thought, 2)])
                .xp([(SkillTag::Calling, 25.0)])
                .tags([Buff, Duration, Voice])
                .unlock_when(Requirements::skill(SkillTag::Speech, 4))
                .duration(25.0)
                .cooldown(60.0)
                .potency(2.0),
            Recipe::new("Intone")
                .inputs([(Sound, 1)])
                .xp([(SkillTag::Speech, 2.0)])
                .tags([Voice])
                .unlock_when(Requirements::resource(Sound, 1.0))
                .charging(),
            Recipe::new("Murmur")
                .inputs([(Insight, 1)])
                .cast_cost([(Insight, 15)])
                .outputs([(Sound, 1)])
                .xp([(SkillTag::Speech, 5.0)])
                .tags([SingleCast, Voice])
                .cooldown(0.5),
        ])
    }

    /// Recipes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    /// Number of recipes.
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Look up a recipe by name.
    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.name == name)
    }

    /// The first unlocked recipe, in declaration order, whose inputs are
    /// satisfied by `counts`.
    pub fn first_match(&self, counts: &BTreeMap<Resource, u32>) -> Option<&Recipe> {
        self.recipes
            .iter()
            .find(|r| r.is_unlocked() && r.satisfied_by(counts))
    }

    /// Unlock a recipe by name. Returns `true` only on the transition from
    /// locked to unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownRecipe`] if the name is not in the book.
    pub fn unlock(&mut self, name: &str) -> Result<bool, EconomyError> {
        let recipe = self
            .recipes
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| EconomyError::UnknownRecipe(name.to_owned()))?;
        let newly = !recipe.unlocked;
        recipe.unlocked = true;
        Ok(newly)
    }

    /// Flip every locked recipe whose unlock conditions now hold.
    ///
    /// Returns the names unlocked by this call, in declaration order.
    pub fn evaluate_unlocks(&mut self, pools: &Pools, skills: &SkillSet) -> Vec<String> {
        let mut unlocked = Vec::new();
        for recipe in &mut self.recipes {
            if recipe.unlocked {
                continue;
            }
            let ready = recipe
                .unlock_when
                .as_ref()
                .is_none_or(|req| req.is_met(pools, skills));
            if ready {
                recipe.unlocked = true;
                unlocked.push(recipe.name.clone());
            }
        }
        unlocked
    }

    /// Names of unlocked recipes.
    pub fn unlocked_names(&self) -> Vec<String> {
        self.recipes
            .iter()
            .filter(|r| r.unlocked)
            .map(|r| r.name.clone())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pool::ResourcePool;

    fn pools_with(amounts: &[(Resource, f64)]) -> Pools {
        Pools::from_map(
            amounts
                .iter()
                .map(|(r, a)| (*r, ResourcePool::with_current(*a, 100.0, true).unwrap()))
                .collect(),
        )
    }

    #[test]
    fn standard_book_is_valid() {
        let book = RecipeBook::standard().unwrap();
        assert_eq!(book.len(), 7);
        assert!(book.get("Murmur").unwrap().is_unlocked());
        assert!(!book.get("Articulate").unwrap().is_unlocked());
    }

    #[test]
    fn empty_inputs_rejected() {
        let err = RecipeBook::new(vec![Recipe::new("Nothing")]).unwrap_err();
        assert!(matches!(err, EconomyError::InvalidRecipe { .. }));
    }

    #[test]
    fn duplicate_names_rejected() {
        let a = Recipe::new("Twice").inputs([(Resource::Sound, 1)]);
        let err = RecipeBook::new(vec![a.clone(), a]).unwrap_err();
        assert!(matches!(err, EconomyError::DuplicateRecipe(name) if name == "Twice"));
    }

    #[test]
    fn buff_without_duration_rejected() {
        let bad = Recipe::new("Hollow")
            .inputs([(Resource::Sound, 1)])
            .tags([RecipeTag::Buff]);
        assert!(RecipeBook::new(vec![bad]).is_err());
    }

    #[test]
    fn cost_defaults_to_inputs() {
        let r = Recipe::new("Plain").inputs([(Resource::Sound, 1), (Resource::Insight, 1)]);
        let cost = r.cost();
        assert!((cost[&Resource::Sound] - 1.0).abs() < f64::EPSILON);
        assert!((cost[&Resource::Insight] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn first_match_respects_declaration_order() {
        let book = RecipeBook::new(vec![
            Recipe::new("Pair").inputs([(Resource::Sound, 1), (Resource::Insight, 1)]),
            Recipe::new("Single").inputs([(Resource::Insight, 1)]),
        ])
        .unwrap();
        let counts = BTreeMap::from([(Resource::Sound, 1), (Resource::Insight, 1)]);
        assert_eq!(book.first_match(&counts).unwrap().name, "Pair");

        let counts = BTreeMap::from([(Resource::Insight, 1)]);
        assert_eq!(book.first_match(&counts).unwrap().name, "Single");
    }

    #[test]
    fn locked_recipes_are_skipped_when_matching() {
        let book = RecipeBook::new(vec![
            Recipe::new("Gated")
                .inputs([(Resource::Insight, 1)])
                .unlock_when(Requirements::resource(Resource::Word, 5.0)),
            Recipe::new("Open").inputs([(Resource::Insight, 1)]),
        ])
        .unwrap();
        let counts = BTreeMap::from([(Resource::Insight, 1)]);
        assert_eq!(book.first_match(&counts).unwrap().name, "Open");
    }

    #[test]
    fn unlocks_are_monotonic() {
        let mut book = RecipeBook::standard().unwrap();
        let skills = SkillSet::new();

        let unlocked = book.evaluate_unlocks(&pools_with(&[(Resource::Thought, 3.0)]), &skills);
        assert_eq!(unlocked, vec!["Articulate".to_owned()]);

        // Conditions no longer hold, the recipe stays unlocked.
        let unlocked = book.evaluate_unlocks(&pools_with(&[]), &skills);
        assert!(unlocked.is_empty());
        assert!(book.get("Articulate").unwrap().is_unlocked());
    }

    #[test]
    fn unlock_reports_transition_once() {
        let mut book = RecipeBook::standard().unwrap();
        assert!(book.unlock("Call").unwrap());
        assert!(!book.unlock("Call").unwrap());
        assert!(book.unlock("Nope").is_err());
    }

    #[test]
    fn xp_is_split_between_skills() {
        let book = RecipeBook::standard().unwrap();
        let shares: Vec<_> = book.get("Articulate").unwrap().xp_shares().collect();
        assert_eq!(shares.len(), 2);
        assert!(shares.iter().all(|(_, xp)| (xp - 12.0).abs() < f64::EPSILON));
    }

    #[test]
    fn requirement_reason_names_the_gap() {
        let req = Requirements::skill(SkillTag::Reflection, 2);
        let reason = req.check(&pools_with(&[]), &SkillSet::new()).unwrap_err();
        assert_eq!(reason, "requires reflection level 2 (currently 0)");
    }
}
