use crate::domain::{Flower, FlowerId, FlowerSize};

macro_rules! flower {
    ($id:expr, $name:expr, $meaning:expr, $month:expr, $size:ident) => {
        Flower {
            id: FlowerId($id),
            name: $name,
            meaning: $meaning,
            birth_month: $month,
            size: FlowerSize::$size,
            color: None,
        }
    };
}

static FLOWERS: [Flower; 12] = [
    flower!(1, "orchid", "Beauty", "October", Medium),
    flower!(2, "tulip", "Perfect love", "April", Medium),
    flower!(3, "dahlia", "Elegance", "August", Small),
    flower!(4, "anemone", "Anticipation", "September", Medium),
    flower!(5, "carnation", "Fascination", "January", Large),
    flower!(6, "zinnia", "Lasting Affection", "July", Medium),
    flower!(7, "ranunculus", "Radiant Charm", "March", Medium),
    flower!(8, "sunflower", "Adoration", "August", Large),
    flower!(9, "lily", "Purity", "May", Large),
    flower!(10, "daisy", "Innocence", "April", Small),
    flower!(11, "peony", "Romance", "May", Medium),
    flower!(12, "rose", "Love and passion", "June", Medium),
];

pub fn flowers() -> &'static [Flower] {
    &FLOWERS
}

pub fn find(id: FlowerId) -> Option<&'static Flower> {
    FLOWERS.iter().find(|flower| flower.id == id)
}

pub fn contains(id: FlowerId) -> bool {
    find(id).is_some()
}
