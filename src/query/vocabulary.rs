// Fixed craft vocabulary used to classify and expand queries

pub const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "him", "his", "how", "its", "may", "new", "now", "see", "two",
    "who", "did", "get", "let", "say", "she", "too", "use", "way", "want", "need", "needs",
    "looking", "look", "find", "some", "with", "that", "this", "from", "have", "will", "would",
    "could", "should", "they", "them", "their", "there", "what", "when", "where", "which",
    "into", "than", "then", "also", "just", "like", "very", "much", "more", "most", "such",
    "only", "about", "please", "someone", "somebody", "anyone", "something", "make", "made",
    "makes", "does", "been", "being", "your", "yours", "mine", "ours", "those", "these",
];

/// Multi-word phrases kept as a single concept
pub const CRAFT_PHRASES: &[&str] = &[
    "hand made",
    "custom made",
    "made to order",
    "one of a kind",
    "hand crafted",
    "hand painted",
    "hand woven",
    "hand carved",
    "eco friendly",
    "hand stitched",
];

pub const PRODUCT_KEYWORDS: &[&str] = &[
    "bowl", "vase", "mug", "cup", "plate", "jug", "pot", "pottery", "jewelry", "jewellery",
    "ring", "necklace", "bracelet", "earring", "pendant", "furniture", "table", "chair", "bench",
    "shelf", "cabinet", "quilt", "rug", "blanket", "scarf", "sweater", "bag", "wallet", "belt",
    "candle", "soap", "basket", "lamp", "sculpture", "painting", "print", "card", "toy", "box",
    "knife", "spoon", "tile", "mirror", "frame", "clock", "pillow", "cushion", "tapestry",
];

pub const SKILL_KEYWORDS: &[&str] = &[
    "weaving", "knitting", "crochet", "embroidery", "sewing", "quilting", "carving",
    "woodworking", "woodturning", "carpentry", "joinery", "blacksmithing", "smithing",
    "metalwork", "welding", "glassblowing", "throwing", "glazing", "firing", "sculpting",
    "painting", "calligraphy", "engraving", "leatherwork", "tanning", "dyeing", "spinning",
    "upholstery", "restoration", "repair", "bookbinding", "printmaking", "soldering",
    "enameling", "casting", "forging", "lacquering", "gilding", "macrame", "felting",
];

pub const MATERIAL_KEYWORDS: &[&str] = &[
    "clay", "ceramic", "ceramics", "porcelain", "stoneware", "earthenware", "wood", "wooden",
    "oak", "walnut", "maple", "cherry", "bamboo", "silver", "gold", "copper", "brass", "bronze",
    "iron", "steel", "glass", "leather", "wool", "cotton", "linen", "silk", "hemp", "yarn",
    "stone", "marble", "resin", "wax", "beeswax", "paper", "gemstone", "pearl", "cork",
];

pub const STYLE_KEYWORDS: &[&str] = &[
    "rustic", "modern", "contemporary", "minimalist", "vintage", "retro", "traditional",
    "bohemian", "boho", "scandinavian", "industrial", "farmhouse", "elegant", "classic",
    "whimsical", "abstract", "geometric", "organic", "colorful", "handmade", "handcrafted",
    "artisan", "bespoke", "unique", "luxury", "antique", "folk", "japanese", "mid-century",
];

/// Terms appended for the winning query type
pub const CATEGORY_EXPANSIONS: &[(&str, &[&str])] = &[
    ("product", &["handcrafted", "artisan"]),
    ("skill", &["craftsmanship", "artisan", "expert maker"]),
    ("material", &["natural materials", "handcrafted"]),
    ("style", &["design", "aesthetic", "artisan"]),
    ("mixed", &["artisan", "handcrafted"]),
];

/// Trigger rules; a trigger fires when it is a substring of any concept
pub const TRIGGER_RULES: &[(&str, &[&str])] = &[
    ("pot", &["ceramics", "clay work"]),
    ("ceram", &["pottery", "clay work"]),
    ("clay", &["ceramics", "pottery"]),
    ("wood", &["woodworking", "carpentry"]),
    ("furnitur", &["woodworking", "joinery"]),
    ("jewel", &["jewelry making", "metalwork"]),
    ("silver", &["silversmith", "metalwork"]),
    ("gold", &["goldsmith", "fine jewelry"]),
    ("weav", &["textiles", "loom work"]),
    ("knit", &["textiles", "yarn"]),
    ("quilt", &["textiles", "patchwork"]),
    ("embroider", &["needlework", "textiles"]),
    ("leather", &["leatherwork", "saddlery"]),
    ("glass", &["glassblowing", "glasswork"]),
    ("metal", &["metalwork", "smithing"]),
    ("forg", &["blacksmithing", "metalwork"]),
    ("paint", &["fine art", "illustration"]),
    ("candle", &["candle making", "wax"]),
    ("soap", &["soap making", "natural skincare"]),
    ("hand", &["handcrafted", "artisan"]),
    ("custom", &["bespoke", "made to order"]),
    ("eco", &["sustainable", "natural materials"]),
    ("vintage", &["retro", "antique"]),
    ("restor", &["repair", "refinishing"]),
];

/// Direct synonyms and related terms for exact concepts
pub const CONCEPT_SYNONYMS: &[(&str, &[&str])] = &[
    ("pottery", &["ceramics", "clay work", "stoneware"]),
    ("ceramics", &["pottery", "clay work"]),
    ("handmade", &["handcrafted", "artisan"]),
    ("hand made", &["handmade", "handcrafted"]),
    ("hand crafted", &["handmade", "artisan"]),
    ("custom made", &["bespoke", "personalized"]),
    ("made to order", &["custom", "commission"]),
    ("one of a kind", &["unique", "bespoke"]),
    ("eco friendly", &["sustainable", "recycled"]),
    ("hand painted", &["painted", "decorative"]),
    ("hand woven", &["woven", "textiles"]),
    ("hand carved", &["carved", "woodcarving"]),
    ("hand stitched", &["stitched", "sewn"]),
    ("bowl", &["dish", "vessel"]),
    ("vase", &["vessel", "ceramics"]),
    ("mug", &["cup", "drinkware"]),
    ("jewelry", &["jewellery", "accessories"]),
    ("ring", &["band", "jewelry"]),
    ("necklace", &["pendant", "jewelry"]),
    ("furniture", &["woodwork", "home decor"]),
    ("table", &["furniture", "dining"]),
    ("chair", &["furniture", "seating"]),
    ("quilt", &["blanket", "patchwork"]),
    ("rug", &["carpet", "weaving"]),
    ("scarf", &["knitwear", "textiles"]),
    ("candle", &["wax", "home fragrance"]),
    ("leather", &["hide", "leatherwork"]),
    ("wooden", &["wood", "timber"]),
    ("silver", &["sterling", "metalwork"]),
    ("clay", &["ceramics", "earthenware"]),
    ("rustic", &["farmhouse", "country"]),
    ("modern", &["contemporary", "minimalist"]),
    ("minimalist", &["simple", "clean lines"]),
    ("vintage", &["retro", "classic"]),
    ("wedding", &["bridal", "gift"]),
    ("gift", &["present", "keepsake"]),
];

#[inline]
pub fn lookup(
    table: &'static [(&'static str, &'static [&'static str])],
    key: &str,
) -> &'static [&'static str] {
    table
        .iter()
        .find(|(entry, _)| *entry == key)
        .map_or(&[], |(_, terms)| *terms)
}

#[inline]
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}
