//! Static metadata for the 114 surahs (Hafs numbering).

use serde::Serialize;

/// Total number of ayahs in the mushaf.
pub const TOTAL_AYAHS: u32 = 6236;

/// Number of surahs.
pub const SURAH_COUNT: u16 = 114;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Revelation {
    Meccan,
    Medinan,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SurahInfo {
    pub number: u16,
    pub name_arabic: &'static str,
    pub name_transliterated: &'static str,
    pub name_english: &'static str,
    pub ayah_count: u16,
    pub revelation: Revelation,
}

use Revelation::{Meccan as Mec, Medinan as Med};

const fn s(
    number: u16,
    name_arabic: &'static str,
    name_transliterated: &'static str,
    name_english: &'static str,
    ayah_count: u16,
    revelation: Revelation,
) -> SurahInfo {
    SurahInfo {
        number,
        name_arabic,
        name_transliterated,
        name_english,
        ayah_count,
        revelation,
    }
}

pub static SURAHS: [SurahInfo; 114] = [
    s(1, "الفاتحة", "Al-Fatihah", "The Opening", 7, Mec),
    s(2, "البقرة", "Al-Baqarah", "The Cow", 286, Med),
    s(3, "آل عمران", "Aal-Imran", "The Family of Imran", 200, Med),
    s(4, "النساء", "An-Nisa", "The Women", 176, Med),
    s(5, "المائدة", "Al-Ma'idah", "The Table Spread", 120, Med),
    s(6, "الأنعام", "Al-An'am", "The Cattle", 165, Mec),
    s(7, "الأعراف", "Al-A'raf", "The Heights", 206, Mec),
    s(8, "الأنفال", "Al-Anfal", "The Spoils of War", 75, Med),
    s(9, "التوبة", "At-Tawbah", "The Repentance", 129, Med),
    s(10, "يونس", "Yunus", "Jonah", 109, Mec),
    s(11, "هود", "Hud", "Hud", 123, Mec),
    s(12, "يوسف", "Yusuf", "Joseph", 111, Mec),
    s(13, "الرعد", "Ar-Ra'd", "The Thunder", 43, Med),
    s(14, "إبراهيم", "Ibrahim", "Abraham", 52, Mec),
    s(15, "الحجر", "Al-Hijr", "The Rocky Tract", 99, Mec),
    s(16, "النحل", "An-Nahl", "The Bee", 128, Mec),
    s(17, "الإسراء", "Al-Isra", "The Night Journey", 111, Mec),
    s(18, "الكهف", "Al-Kahf", "The Cave", 110, Mec),
    s(19, "مريم", "Maryam", "Mary", 98, Mec),
    s(20, "طه", "Ta-Ha", "Ta-Ha", 135, Mec),
    s(21, "الأنبياء", "Al-Anbiya", "The Prophets", 112, Mec),
    s(22, "الحج", "Al-Hajj", "The Pilgrimage", 78, Med),
    s(23, "المؤمنون", "Al-Mu'minun", "The Believers", 118, Mec),
    s(24, "النور", "An-Nur", "The Light", 64, Med),
    s(25, "الفرقان", "Al-Furqan", "The Criterion", 77, Mec),
    s(26, "الشعراء", "Ash-Shu'ara", "The Poets", 227, Mec),
    s(27, "النمل", "An-Naml", "The Ant", 93, Mec),
    s(28, "القصص", "Al-Qasas", "The Stories", 88, Mec),
    s(29, "العنكبوت", "Al-Ankabut", "The Spider", 69, Mec),
    s(30, "الروم", "Ar-Rum", "The Romans", 60, Mec),
    s(31, "لقمان", "Luqman", "Luqman", 34, Mec),
    s(32, "السجدة", "As-Sajdah", "The Prostration", 30, Mec),
    s(33, "الأحزاب", "Al-Ahzab", "The Combined Forces", 73, Med),
    s(34, "سبأ", "Saba", "Sheba", 54, Mec),
    s(35, "فاطر", "Fatir", "Originator", 45, Mec),
    s(36, "يس", "Ya-Sin", "Ya-Sin", 83, Mec),
    s(37, "الصافات", "As-Saffat", "Those Who Set the Ranks", 182, Mec),
    s(38, "ص", "Sad", "The Letter Sad", 88, Mec),
    s(39, "الزمر", "Az-Zumar", "The Troops", 75, Mec),
    s(40, "غافر", "Ghafir", "The Forgiver", 85, Mec),
    s(41, "فصلت", "Fussilat", "Explained in Detail", 54, Mec),
    s(42, "الشورى", "Ash-Shura", "The Consultation", 53, Mec),
    s(43, "الزخرف", "Az-Zukhruf", "The Ornaments of Gold", 89, Mec),
    s(44, "الدخان", "Ad-Dukhan", "The Smoke", 59, Mec),
    s(45, "الجاثية", "Al-Jathiyah", "The Crouching", 37, Mec),
    s(46, "الأحقاف", "Al-Ahqaf", "The Wind-Curved Sandhills", 35, Mec),
    s(47, "محمد", "Muhammad", "Muhammad", 38, Med),
    s(48, "الفتح", "Al-Fath", "The Victory", 29, Med),
    s(49, "الحجرات", "Al-Hujurat", "The Rooms", 18, Med),
    s(50, "ق", "Qaf", "The Letter Qaf", 45, Mec),
    s(51, "الذاريات", "Adh-Dhariyat", "The Winnowing Winds", 60, Mec),
    s(52, "الطور", "At-Tur", "The Mount", 49, Mec),
    s(53, "النجم", "An-Najm", "The Star", 62, Mec),
    s(54, "القمر", "Al-Qamar", "The Moon", 55, Mec),
    s(55, "الرحمن", "Ar-Rahman", "The Beneficent", 78, Med),
    s(56, "الواقعة", "Al-Waqi'ah", "The Inevitable", 96, Mec),
    s(57, "الحديد", "Al-Hadid", "The Iron", 29, Med),
    s(58, "المجادلة", "Al-Mujadila", "The Pleading Woman", 22, Med),
    s(59, "الحشر", "Al-Hashr", "The Exile", 24, Med),
    s(60, "الممتحنة", "Al-Mumtahanah", "She That Is to Be Examined", 13, Med),
    s(61, "الصف", "As-Saff", "The Ranks", 14, Med),
    s(62, "الجمعة", "Al-Jumu'ah", "The Congregation", 11, Med),
    s(63, "المنافقون", "Al-Munafiqun", "The Hypocrites", 11, Med),
    s(64, "التغابن", "At-Taghabun", "The Mutual Disillusion", 18, Med),
    s(65, "الطلاق", "At-Talaq", "The Divorce", 12, Med),
    s(66, "التحريم", "At-Tahrim", "The Prohibition", 12, Med),
    s(67, "الملك", "Al-Mulk", "The Sovereignty", 30, Mec),
    s(68, "القلم", "Al-Qalam", "The Pen", 52, Mec),
    s(69, "الحاقة", "Al-Haqqah", "The Reality", 52, Mec),
    s(70, "المعارج", "Al-Ma'arij", "The Ascending Stairways", 44, Mec),
    s(71, "نوح", "Nuh", "Noah", 28, Mec),
    s(72, "الجن", "Al-Jinn", "The Jinn", 28, Mec),
    s(73, "المزمل", "Al-Muzzammil", "The Enshrouded One", 20, Mec),
    s(74, "المدثر", "Al-Muddaththir", "The Cloaked One", 56, Mec),
    s(75, "القيامة", "Al-Qiyamah", "The Resurrection", 40, Mec),
    s(76, "الإنسان", "Al-Insan", "The Man", 31, Med),
    s(77, "المرسلات", "Al-Mursalat", "The Emissaries", 50, Mec),
    s(78, "النبأ", "An-Naba", "The Tidings", 40, Mec),
    s(79, "النازعات", "An-Nazi'at", "Those Who Drag Forth", 46, Mec),
    s(80, "عبس", "Abasa", "He Frowned", 42, Mec),
    s(81, "التكوير", "At-Takwir", "The Overthrowing", 29, Mec),
    s(82, "الانفطار", "Al-Infitar", "The Cleaving", 19, Mec),
    s(83, "المطففين", "Al-Mutaffifin", "The Defrauding", 36, Mec),
    s(84, "الانشقاق", "Al-Inshiqaq", "The Sundering", 25, Mec),
    s(85, "البروج", "Al-Buruj", "The Mansions of the Stars", 22, Mec),
    s(86, "الطارق", "At-Tariq", "The Nightcomer", 17, Mec),
    s(87, "الأعلى", "Al-A'la", "The Most High", 19, Mec),
    s(88, "الغاشية", "Al-Ghashiyah", "The Overwhelming", 26, Mec),
    s(89, "الفجر", "Al-Fajr", "The Dawn", 30, Mec),
    s(90, "البلد", "Al-Balad", "The City", 20, Mec),
    s(91, "الشمس", "Ash-Shams", "The Sun", 15, Mec),
    s(92, "الليل", "Al-Layl", "The Night", 21, Mec),
    s(93, "الضحى", "Ad-Duha", "The Morning Hours", 11, Mec),
    s(94, "الشرح", "Ash-Sharh", "The Relief", 8, Mec),
    s(95, "التين", "At-Tin", "The Fig", 8, Mec),
    s(96, "العلق", "Al-Alaq", "The Clot", 19, Mec),
    s(97, "القدر", "Al-Qadr", "The Power", 5, Mec),
    s(98, "البينة", "Al-Bayyinah", "The Clear Proof", 8, Med),
    s(99, "الزلزلة", "Az-Zalzalah", "The Earthquake", 8, Med),
    s(100, "العاديات", "Al-Adiyat", "The Courser", 11, Mec),
    s(101, "القارعة", "Al-Qari'ah", "The Calamity", 11, Mec),
    s(102, "التكاثر", "At-Takathur", "The Rivalry in World Increase", 8, Mec),
    s(103, "العصر", "Al-Asr", "The Declining Day", 3, Mec),
    s(104, "الهمزة", "Al-Humazah", "The Traducer", 9, Mec),
    s(105, "الفيل", "Al-Fil", "The Elephant", 5, Mec),
    s(106, "قريش", "Quraysh", "Quraysh", 4, Mec),
    s(107, "الماعون", "Al-Ma'un", "The Small Kindnesses", 7, Mec),
    s(108, "الكوثر", "Al-Kawthar", "The Abundance", 3, Mec),
    s(109, "الكافرون", "Al-Kafirun", "The Disbelievers", 6, Mec),
    s(110, "النصر", "An-Nasr", "The Divine Support", 3, Med),
    s(111, "المسد", "Al-Masad", "The Palm Fiber", 5, Mec),
    s(112, "الإخلاص", "Al-Ikhlas", "The Sincerity", 4, Mec),
    s(113, "الفلق", "Al-Falaq", "The Daybreak", 5, Mec),
    s(114, "الناس", "An-Nas", "Mankind", 6, Mec),
];

/// Look up a surah by its 1-based number.
pub fn surah(number: u16) -> Option<&'static SurahInfo> {
    if number == 0 {
        return None;
    }
    SURAHS.get(usize::from(number) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_complete() {
        let total: u32 = SURAHS.iter().map(|s| u32::from(s.ayah_count)).sum();
        assert_eq!(total, TOTAL_AYAHS);
        for (i, info) in SURAHS.iter().enumerate() {
            assert_eq!(usize::from(info.number), i + 1);
        }
    }

    #[test]
    fn test_lookup_bounds() {
        assert!(surah(0).is_none());
        assert!(surah(115).is_none());
        assert_eq!(surah(2).unwrap().ayah_count, 286);
        assert_eq!(surah(114).unwrap().name_transliterated, "An-Nas");
    }
}
