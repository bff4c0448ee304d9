// Heuristic lexicons behind the analyzers

/// Profession fragment to the skills that profession implies
pub const PROFESSION_SKILLS: &[(&str, &[&str])] = &[
    ("potter", &["wheel throwing", "hand building", "glazing", "kiln firing"]),
    ("ceramic", &["wheel throwing", "hand building", "glazing", "kiln firing"]),
    ("wood", &["joinery", "woodturning", "wood finishing", "carving"]),
    ("carpent", &["joinery", "framing", "wood finishing"]),
    ("furniture", &["joinery", "upholstery", "wood finishing", "restoration"]),
    ("jewel", &["metalsmithing", "stone setting", "soldering", "polishing"]),
    ("silversmith", &["metalsmithing", "soldering", "polishing", "engraving"]),
    ("goldsmith", &["metalsmithing", "stone setting", "casting"]),
    ("blacksmith", &["forging", "metalwork", "welding"]),
    ("weaver", &["loom weaving", "dyeing", "spinning"]),
    ("knit", &["knitting", "pattern design"]),
    ("quilt", &["quilting", "piecing", "appliqué"]),
    ("tailor", &["sewing", "pattern making", "alterations"]),
    ("seamstress", &["sewing", "pattern making", "alterations"]),
    ("leather", &["leatherwork", "hand stitching", "tooling"]),
    ("glass", &["glassblowing", "kiln forming", "cold working"]),
    ("painter", &["painting", "color mixing", "composition"]),
    ("illustrat", &["drawing", "composition"]),
    ("candle", &["candle making", "fragrance blending"]),
    ("soap", &["soap making", "fragrance blending"]),
    ("basket", &["basket weaving"]),
    ("bookbind", &["bookbinding", "paper crafts"]),
];

/// Description fragment to the skill it evidences
pub const DESCRIPTION_SKILLS: &[(&str, &str)] = &[
    ("wheel", "wheel throwing"),
    ("glaz", "glazing"),
    ("kiln", "kiln firing"),
    ("carv", "carving"),
    ("turning", "woodturning"),
    ("joiner", "joinery"),
    ("restor", "restoration"),
    ("repair", "repair"),
    ("engrav", "engraving"),
    ("embroider", "embroidery"),
    ("upholster", "upholstery"),
    ("weld", "welding"),
    ("solder", "soldering"),
    ("forg", "forging"),
    ("dye", "dyeing"),
    ("spin", "spinning"),
    ("sew", "sewing"),
    ("knit", "knitting"),
    ("crochet", "crochet"),
    ("calligraph", "calligraphy"),
    ("stone setting", "stone setting"),
    ("blow", "glassblowing"),
];

pub const STYLES: &[&str] = &[
    "rustic",
    "modern",
    "contemporary",
    "minimalist",
    "vintage",
    "retro",
    "traditional",
    "bohemian",
    "scandinavian",
    "industrial",
    "farmhouse",
    "elegant",
    "classic",
    "whimsical",
    "abstract",
    "geometric",
    "organic",
    "folk",
    "art deco",
    "mid-century",
];

pub const MATERIALS: &[&str] = &[
    "clay",
    "porcelain",
    "stoneware",
    "earthenware",
    "wood",
    "oak",
    "walnut",
    "maple",
    "cherry",
    "bamboo",
    "silver",
    "gold",
    "copper",
    "brass",
    "bronze",
    "iron",
    "steel",
    "glass",
    "leather",
    "wool",
    "cotton",
    "linen",
    "silk",
    "hemp",
    "stone",
    "marble",
    "resin",
    "beeswax",
    "soy wax",
    "gemstone",
    "pearl",
    "recycled",
    "reclaimed",
];

pub const TECHNIQUES: &[&str] = &[
    "wheel-thrown",
    "hand-thrown",
    "hand-built",
    "raku",
    "glazing",
    "slip casting",
    "inlay",
    "dovetail",
    "marquetry",
    "turning",
    "carving",
    "forging",
    "casting",
    "soldering",
    "engraving",
    "enameling",
    "etching",
    "hand stitching",
    "tooling",
    "weaving",
    "knitting",
    "crochet",
    "embroidery",
    "natural dyeing",
    "block printing",
    "screen printing",
    "glassblowing",
    "lampworking",
    "gilding",
    "lacquering",
];

/// Review fragment to the aspect it praises
pub const POSITIVE_TERMS: &[(&str, &str)] = &[
    ("beautiful", "beautiful work"),
    ("gorgeous", "beautiful work"),
    ("stunning", "beautiful work"),
    ("quality", "high quality"),
    ("well made", "high quality"),
    ("sturdy", "durability"),
    ("durable", "durability"),
    ("fast", "fast delivery"),
    ("quick", "fast delivery"),
    ("on time", "reliable timing"),
    ("friendly", "friendly service"),
    ("helpful", "friendly service"),
    ("communicat", "good communication"),
    ("recommend", "recommended"),
    ("love", "customer delight"),
    ("perfect", "attention to detail"),
    ("detail", "attention to detail"),
    ("professional", "professionalism"),
    ("excellent", "excellent overall"),
    ("amazing", "excellent overall"),
    ("great", "excellent overall"),
];

/// Review fragment to the aspect it criticizes
pub const NEGATIVE_TERMS: &[(&str, &str)] = &[
    ("slow", "slow delivery"),
    ("late", "slow delivery"),
    ("delay", "slow delivery"),
    ("broke", "durability issues"),
    ("cracked", "durability issues"),
    ("flimsy", "durability issues"),
    ("rude", "poor service"),
    ("unresponsive", "poor communication"),
    ("never replied", "poor communication"),
    ("overpriced", "high price"),
    ("expensive", "high price"),
    ("disappoint", "disappointing"),
    ("poor", "poor quality"),
    ("damaged", "shipping damage"),
    ("wrong", "order errors"),
];

pub const CUSTOM_ORDER_TERMS: &[&str] = &[
    "custom",
    "commission",
    "bespoke",
    "made to order",
    "personalized",
];

pub const ECO_TERMS: &[&str] = &[
    "eco",
    "sustainable",
    "recycled",
    "reclaimed",
    "organic",
    "upcycled",
    "natural dye",
];
