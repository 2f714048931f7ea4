use std::collections::HashSet;

use serde::Deserialize;

const DEFAULT_WORDS: &[&str] = &[
    "anal", "anus", "arse", "arsehole", "ass", "asses", "assfucker", "asshole", "assholes",
    "asswhole", "b00bs", "ballbag", "ballsack", "bastard", "bastards", "beastial",
    "beastiality", "bellend", "bestial", "bestiality", "biatch", "bitch", "bitcher",
    "bitchers", "bitches", "bitchin", "bitching", "blowjob", "blowjobs", "boiolas",
    "bollock", "bollocks", "boner", "boob", "boobs", "booobs", "boooobs", "breasts",
    "buceta", "bugger", "bullshit", "bum", "butthole", "buttmuch", "buttplug",
    "carpetmuncher", "cawk", "chink", "cipa", "clit", "clitoris", "clits", "cnut", "cock",
    "cockface", "cockhead", "cockmunch", "cockmuncher", "cocks", "cocksuck", "cocksucked",
    "cocksucker", "cocksucking", "cok", "coksucka", "cox", "crap", "cum", "cummer",
    "cumming", "cums", "cumshot", "cunilingus", "cunillingus", "cunnilingus", "cunt",
    "cuntlick", "cuntlicker", "cuntlicking", "cunts", "cyberfuck", "cyberfucked",
    "cyberfucker", "cyberfucking", "damn", "dick", "dickhead", "dildo", "dildos", "dink",
    "dinks", "dirsa", "dlck", "doggin", "dogging", "donkeyribber", "doosh", "douche",
    "douchebag", "duche", "dyke", "ejaculate", "ejaculated", "ejaculating", "ejaculation",
    "ejakulate", "fag", "fagging", "faggitt", "faggot", "faggs", "fagot", "fagots", "fags",
    "fanny", "fannyflaps", "fannyfucker", "fanyy", "fatass", "fcuk", "fcuker", "fcuking",
    "feck", "fecker", "felching", "fellate", "fellatio", "fingerfuck", "fingerfucked",
    "fingerfucker", "fingerfucking", "fistfuck", "fistfucked", "fistfucker", "fistfucking",
    "flange", "fook", "fooker", "fuck", "fucka", "fucked", "fucker", "fuckers", "fuckhead",
    "fuckheads", "fuckin", "fucking", "fuckings", "fuckme", "fucks", "fuckwhit", "fuckwit",
    "fudgepacker", "fuk", "fuker", "fukker", "fukkin", "fuks", "fukwhit", "fukwit", "fux",
    "gangbang", "gangbanged", "gangbangs", "gaylord", "gaysex", "goatse", "goddamn",
    "goddamned", "hardcoresex", "hell", "heshe", "hoar", "hoare", "hoer", "homo", "hore",
    "horniest", "horny", "hotsex", "jackass", "jackoff", "jap", "jerkoff", "jism", "jiz",
    "jizm", "jizz", "kawk", "knob", "knobead", "knobed", "knobend", "knobhead", "knobjocky",
    "knobjokey", "kock", "kondum", "kondums", "kum", "kummer", "kumming", "kums",
    "kunilingus", "labia", "lmfao", "lust", "lusting", "masochist", "masterbate",
    "masterbating", "masterbation", "masturbate", "masturbation", "mofo", "mothafuck",
    "mothafucka", "mothafuckas", "mothafucker", "mothafuckers", "mothafucking",
    "motherfuck", "motherfucked", "motherfucker", "motherfuckers", "motherfuckin",
    "motherfucking", "muff", "mutha", "muthafecker", "muthafuckker", "muther",
    "mutherfucker", "n1gga", "n1gger", "nazi", "nigg3r", "nigga", "niggah", "niggas",
    "niggaz", "nigger", "niggers", "nob", "nobhead", "nobjocky", "nobjokey", "numbnuts",
    "nutsack", "orgasim", "orgasm", "orgasms", "phonesex", "phuck", "phuk", "phuked",
    "phuking", "phukked", "phukking", "phuks", "phuq", "pigfucker", "pimpis", "piss",
    "pissed", "pisser", "pissers", "pisses", "pissflaps", "pissin", "pissing", "pissoff",
    "poop", "porn", "porno", "pornography", "pornos", "prick", "pricks", "pron", "pube",
    "pusse", "pussi", "pussies", "pussy", "pussys", "rectum", "retard", "rimjaw", "rimming",
    "sadist", "schlong", "screwing", "scroat", "scrote", "scrotum", "semen", "sex", "shag",
    "shagger", "shaggin", "shagging", "shemale", "shit", "shitdick", "shite", "shited",
    "shitey", "shitfuck", "shitfull", "shithead", "shiting", "shitings", "shits", "shitted",
    "shitter", "shitters", "shitting", "shittings", "shitty", "skank", "slut", "sluts",
    "smegma", "smut", "snatch", "spac", "spunk", "teets", "teez", "testical", "testicle",
    "tit", "titfuck", "tits", "titt", "tittiefucker", "titties", "tittyfuck", "tittywank",
    "titwank", "tosser", "turd", "tw4t", "twat", "twathead", "twatty", "twunt", "twunter",
    "vagina", "viagra", "vulva", "w00se", "wang", "wank", "wanker", "wanky", "whoar",
    "whore", "willies", "willy", "xrated", "xxx",
];

/// Word list overrides loaded from the `profanity` config section.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FilterConfig {
    #[serde(default)]
    pub extra_words: Vec<String>,
    #[serde(default)]
    pub allowed_words: Vec<String>,
}

/// Whole-word, case-insensitive profanity check.
#[derive(Debug, Clone)]
pub struct ProfanityFilter {
    words: HashSet<String>,
}

impl Default for ProfanityFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}

impl ProfanityFilter {
    pub fn new(config: &FilterConfig) -> Self {
        let mut words: HashSet<String> = DEFAULT_WORDS.iter().map(|w| w.to_string()).collect();
        words.extend(config.extra_words.iter().map(|w| w.to_lowercase()));
        for allowed in &config.allowed_words {
            words.remove(&allowed.to_lowercase());
        }
        Self { words }
    }

    pub fn is_profane(&self, text: &str) -> bool {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .any(|token| self.words.contains(&token.to_lowercase()))
    }
}
